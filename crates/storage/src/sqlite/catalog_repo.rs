use std::collections::HashMap;

use campus_core::model::{Course, CourseId, Lesson};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_course_row, map_lesson_row, ser, usize_to_i64};
use crate::repository::{CatalogRepository, StorageError};

#[async_trait::async_trait]
impl CatalogRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, position, title, instructor, price_cents)
            VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM courses), ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                instructor = excluded.instructor,
                price_cents = excluded.price_cents
            ",
        )
        .bind(course.id().as_str())
        .bind(course.title())
        .bind(course.instructor())
        .bind(i64::from(course.price().cents()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM lessons WHERE course_id = ?1")
            .bind(course.id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (pos, lesson) in course.lessons().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO lessons (
                    course_id, id, position, title, duration_secs, completed, media_url, is_preview
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(course.id().as_str())
            .bind(lesson.id().as_str())
            .bind(usize_to_i64("position", pos)?)
            .bind(lesson.title())
            .bind(i64::from(lesson.duration_secs()))
            .bind(lesson.completed())
            .bind(lesson.media().as_str())
            .bind(lesson.is_preview())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let Some(row) = sqlx::query(
            "SELECT id, title, instructor, price_cents FROM courses WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        else {
            return Ok(None);
        };

        let lesson_rows = sqlx::query(
            r"
            SELECT id, title, duration_secs, completed, media_url, is_preview
            FROM lessons
            WHERE course_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let lessons = lesson_rows
            .iter()
            .map(map_lesson_row)
            .collect::<Result<Vec<_>, _>>()?;
        map_course_row(&row, lessons).map(Some)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let course_rows = sqlx::query(
            "SELECT id, title, instructor, price_cents FROM courses ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let lesson_rows = sqlx::query(
            r"
            SELECT course_id, id, title, duration_secs, completed, media_url, is_preview
            FROM lessons
            ORDER BY course_id ASC, position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut lessons_by_course: HashMap<String, Vec<Lesson>> = HashMap::new();
        for row in &lesson_rows {
            let course_id: String = row.try_get("course_id").map_err(ser)?;
            lessons_by_course
                .entry(course_id)
                .or_default()
                .push(map_lesson_row(row)?);
        }

        let mut out = Vec::with_capacity(course_rows.len());
        for row in &course_rows {
            let id: String = row.try_get("id").map_err(ser)?;
            let lessons = lessons_by_course.remove(&id).unwrap_or_default();
            out.push(map_course_row(row, lessons)?);
        }
        Ok(out)
    }
}
