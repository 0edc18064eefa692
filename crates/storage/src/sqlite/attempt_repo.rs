use campus_core::model::{AttemptSummary, SubjectId};

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row};
use crate::repository::{AttemptRepository, AttemptRow, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &AttemptSummary) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO attempts (subject_id, started_at, completed_at, score, total, completion)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(attempt.subject_id().as_str())
        .bind(attempt.started_at())
        .bind(attempt.completed_at())
        .bind(i64::from(attempt.score()))
        .bind(i64::from(attempt.total()))
        .bind(attempt.completion().as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_attempt(&self, id: i64) -> Result<AttemptSummary, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, subject_id, started_at, completed_at, score, total, completion
            FROM attempts
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row).map(|r| r.summary)
    }

    async fn list_attempts(
        &self,
        subject_id: &SubjectId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, subject_id, started_at, completed_at, score, total, completion
            FROM attempts
            WHERE subject_id = ?1
            ORDER BY completed_at DESC, id DESC
            LIMIT ?2
            ",
        )
        .bind(subject_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
