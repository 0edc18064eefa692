use std::sync::Arc;

use campus_core::model::AssessmentConfig;
use storage::repository::Storage;

use crate::Clock;
use crate::assessments::AssessmentLoopService;
use crate::entitlements::EntitlementService;
use crate::error::AppServicesError;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    entitlements: Arc<EntitlementService>,
    assessments: Arc<AssessmentLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: AssessmentConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, config))
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, config: AssessmentConfig) -> Self {
        let entitlements = Arc::new(EntitlementService::new(
            clock,
            Arc::clone(&storage.catalog),
            Arc::clone(&storage.entitlements),
        ));
        let assessments = Arc::new(
            AssessmentLoopService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.attempts),
            )
            .with_config(config),
        );

        Self {
            storage,
            entitlements,
            assessments,
        }
    }

    /// Raw repositories, for seeding and authoring.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn entitlements(&self) -> Arc<EntitlementService> {
        Arc::clone(&self.entitlements)
    }

    #[must_use]
    pub fn assessments(&self) -> Arc<AssessmentLoopService> {
        Arc::clone(&self.assessments)
    }
}
