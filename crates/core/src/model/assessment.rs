use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds allowed for one quiz run unless configured otherwise.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentConfigError {
    #[error("time limit must be > 0 seconds")]
    InvalidTimeLimit,
}

/// Per-session quiz settings, injected at session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssessmentConfigRecord")]
pub struct AssessmentConfig {
    time_limit_secs: u32,
    shuffle_questions: bool,
}

#[derive(Deserialize)]
struct AssessmentConfigRecord {
    time_limit_secs: u32,
    #[serde(default)]
    shuffle_questions: bool,
}

impl TryFrom<AssessmentConfigRecord> for AssessmentConfig {
    type Error = AssessmentConfigError;

    fn try_from(record: AssessmentConfigRecord) -> Result<Self, Self::Error> {
        Self::new(record.time_limit_secs, record.shuffle_questions)
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            shuffle_questions: false,
        }
    }
}

impl AssessmentConfig {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentConfigError::InvalidTimeLimit` if `time_limit_secs` is zero.
    pub fn new(
        time_limit_secs: u32,
        shuffle_questions: bool,
    ) -> Result<Self, AssessmentConfigError> {
        if time_limit_secs == 0 {
            return Err(AssessmentConfigError::InvalidTimeLimit);
        }
        Ok(Self {
            time_limit_secs,
            shuffle_questions,
        })
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    #[must_use]
    pub fn shuffle_questions(&self) -> bool {
        self.shuffle_questions
    }
}
