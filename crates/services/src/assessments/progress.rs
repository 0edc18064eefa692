use serde::Serialize;

use super::session::AssessmentState;

/// Snapshot of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentProgress {
    pub state: AssessmentState,
    /// 0-based index of the current question.
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub score: u32,
    pub time_remaining: u32,
    pub selected: Option<usize>,
}
