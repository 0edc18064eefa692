mod service;
mod store;

pub use crate::error::EntitlementServiceError;
pub use service::EntitlementService;
pub use store::{EntitlementStore, PlaybackDecision};
