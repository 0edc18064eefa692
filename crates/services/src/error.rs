//! Shared error types for the services crate.

use thiserror::Error;

use campus_core::CatalogError;
use campus_core::model::AttemptError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `EntitlementService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EntitlementServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by assessment services.
///
/// In-session operations never fail; only summary building and
/// persistence return this.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("assessment has not completed")]
    NotCompleted,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
