mod progress;
mod session;
mod workflow;

pub use crate::error::AssessmentError;
pub use progress::AssessmentProgress;
pub use session::{AdvanceOutcome, AnswerRecord, AssessmentSession, AssessmentState};
pub use workflow::AssessmentLoopService;
