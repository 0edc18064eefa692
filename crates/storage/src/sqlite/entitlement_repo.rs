use campus_core::model::CourseId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{EntitlementRepository, PurchaseRecord, StorageError};

#[async_trait::async_trait]
impl EntitlementRepository for SqliteRepository {
    async fn record_purchase(&self, record: &PurchaseRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO purchases (course_id, purchased_at)
            VALUES (?1, ?2)
            ON CONFLICT(course_id) DO NOTHING
            ",
        )
        .bind(record.course_id.as_str())
        .bind(record.purchased_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn purchased_ids(&self) -> Result<Vec<CourseId>, StorageError> {
        let rows = sqlx::query("SELECT course_id FROM purchases")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("course_id")
                    .map(CourseId::new)
                    .map_err(ser)
            })
            .collect()
    }
}
