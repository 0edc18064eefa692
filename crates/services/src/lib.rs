#![forbid(unsafe_code)]

pub mod app_services;
pub mod assessments;
pub mod entitlements;
pub mod error;

pub use campus_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, AssessmentError, EntitlementServiceError};

pub use assessments::{
    AdvanceOutcome, AnswerRecord, AssessmentLoopService, AssessmentProgress, AssessmentSession,
    AssessmentState,
};
pub use entitlements::{EntitlementService, EntitlementStore, PlaybackDecision};
