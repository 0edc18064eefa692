use campus_core::model::{Question, SubjectId};

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, ser, usize_to_i64};
use crate::repository::{QuestionBank, StorageError};

#[async_trait::async_trait]
impl QuestionBank for SqliteRepository {
    async fn get_questions(&self, subject_id: &SubjectId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, prompt, options_json, correct_index
            FROM questions
            WHERE subject_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(subject_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn replace_questions(
        &self,
        subject_id: &SubjectId,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM questions WHERE subject_id = ?1")
            .bind(subject_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (pos, question) in questions.iter().enumerate() {
            let options_json = serde_json::to_string(question.options()).map_err(ser)?;
            sqlx::query(
                r"
                INSERT INTO questions
                    (subject_id, id, position, prompt, options_json, correct_index)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(subject_id.as_str())
            .bind(question.id().as_str())
            .bind(usize_to_i64("position", pos)?)
            .bind(question.prompt())
            .bind(options_json)
            .bind(usize_to_i64("correct_index", question.correct_index())?)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
                other => conn(other),
            })?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
