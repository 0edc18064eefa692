use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::SubjectId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("score ({score}) exceeds total ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// Which trigger ended a quiz run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The last question was answered.
    Answered,
    /// The timer reached zero first.
    TimeExpired,
}

impl Completion {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Completion::Answered => "answered",
            Completion::TimeExpired => "time_expired",
        }
    }
}

/// Final score of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub score: u32,
    pub total: u32,
}

/// Persisted record of one finished quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptSummary {
    subject_id: SubjectId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    score: u32,
    total: u32,
    completion: Completion,
}

impl AttemptSummary {
    /// Build or rehydrate an attempt summary.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidTimeRange` if `completed_at` precedes
    /// `started_at`, or `AttemptError::ScoreExceedsTotal` for an impossible score.
    pub fn new(
        subject_id: SubjectId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: AssessmentResult,
        completion: Completion,
    ) -> Result<Self, AttemptError> {
        if completed_at < started_at {
            return Err(AttemptError::InvalidTimeRange);
        }
        if result.score > result.total {
            return Err(AttemptError::ScoreExceedsTotal {
                score: result.score,
                total: result.total,
            });
        }
        Ok(Self {
            subject_id,
            started_at,
            completed_at,
            score: result.score,
            total: result.total,
            completion,
        })
    }

    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn result(&self) -> AssessmentResult {
        AssessmentResult {
            score: self.score,
            total: self.total,
        }
    }

    #[must_use]
    pub fn completion(&self) -> Completion {
        self.completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn rejects_inverted_time_range() {
        let now = fixed_now();
        let err = AttemptSummary::new(
            SubjectId::new("S1"),
            now,
            now - Duration::seconds(1),
            AssessmentResult { score: 0, total: 3 },
            Completion::Answered,
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::InvalidTimeRange);
    }

    #[test]
    fn rejects_impossible_score() {
        let now = fixed_now();
        let err = AttemptSummary::new(
            SubjectId::new("S1"),
            now,
            now,
            AssessmentResult { score: 4, total: 3 },
            Completion::TimeExpired,
        )
        .unwrap_err();
        assert_eq!(err, AttemptError::ScoreExceedsTotal { score: 4, total: 3 });
    }
}
