use std::sync::Arc;

use campus_core::CatalogSnapshot;
use campus_core::model::{CourseId, Entitlement};
use storage::repository::{CatalogRepository, EntitlementRepository, PurchaseRecord};

use super::store::EntitlementStore;
use crate::Clock;
use crate::error::EntitlementServiceError;

/// Hydrates the entitlement store from storage and persists confirmed purchases.
#[derive(Clone)]
pub struct EntitlementService {
    clock: Clock,
    catalog: Arc<dyn CatalogRepository>,
    entitlements: Arc<dyn EntitlementRepository>,
}

impl EntitlementService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<dyn CatalogRepository>,
        entitlements: Arc<dyn EntitlementRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            entitlements,
        }
    }

    /// Load the catalog and purchased set, and build a store over them.
    ///
    /// # Errors
    ///
    /// Returns `EntitlementServiceError::Storage` if repository access fails.
    /// Returns `EntitlementServiceError::Catalog` if the catalog holds duplicate ids.
    pub async fn load_store(&self) -> Result<EntitlementStore, EntitlementServiceError> {
        let courses = self.catalog.list_courses().await?;
        let catalog = CatalogSnapshot::new(courses)?;
        let entitlement = Entitlement::from_ids(self.entitlements.purchased_ids().await?);
        tracing::debug!(
            courses = catalog.len(),
            purchased = entitlement.len(),
            "entitlement store loaded"
        );
        Ok(EntitlementStore::new(Arc::new(catalog), entitlement))
    }

    /// Apply a payment-confirmed purchase and persist it.
    ///
    /// Already-purchased courses are a no-op and touch no storage. The store is
    /// only updated once the purchase has been recorded.
    ///
    /// Returns `true` if the course was newly purchased.
    ///
    /// # Errors
    ///
    /// Returns `EntitlementServiceError::Storage` if the purchase cannot be recorded.
    pub async fn confirm_purchase(
        &self,
        store: &mut EntitlementStore,
        course_id: CourseId,
    ) -> Result<bool, EntitlementServiceError> {
        if store.is_purchased(&course_id) {
            tracing::debug!(course_id = %course_id, "purchase already recorded");
            return Ok(false);
        }

        let record = PurchaseRecord {
            course_id: course_id.clone(),
            purchased_at: self.clock.now(),
        };
        self.entitlements.record_purchase(&record).await?;
        tracing::info!(course_id = %course_id, "course purchased");
        Ok(store.purchase(course_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use campus_core::model::{Course, LessonId, Price};
    use campus_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn seeded_repo() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for id in ["C1", "C2"] {
            let course = Course::new(
                CourseId::new(id),
                format!("Course {id}"),
                "Staff",
                Price::from_cents(1000),
                vec![],
            )
            .unwrap();
            repo.upsert_course(&course).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn confirmed_purchase_survives_reload() {
        let repo = seeded_repo().await;
        let service = EntitlementService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );

        let mut store = service.load_store().await.unwrap();
        assert!(store.is_lesson_locked(&CourseId::new("C2"), &LessonId::new("any")));
        assert!(service
            .confirm_purchase(&mut store, CourseId::new("C2"))
            .await
            .unwrap());
        assert!(!service
            .confirm_purchase(&mut store, CourseId::new("C2"))
            .await
            .unwrap());

        let reloaded = service.load_store().await.unwrap();
        assert!(reloaded.is_purchased(&CourseId::new("C2")));
        assert!(!reloaded.is_purchased(&CourseId::new("C1")));
        assert_eq!(repo.purchased_ids().await.unwrap().len(), 1);
    }
}
