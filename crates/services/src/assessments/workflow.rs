use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;

use campus_core::model::{AssessmentConfig, SubjectId};
use storage::repository::{AttemptRepository, AttemptRow, QuestionBank};

use super::session::{AssessmentSession, AssessmentState};
use crate::Clock;
use crate::error::AssessmentError;

/// Orchestrates quiz start from the question bank and attempt persistence.
#[derive(Clone)]
pub struct AssessmentLoopService {
    clock: Clock,
    config: AssessmentConfig,
    questions: Arc<dyn QuestionBank>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AssessmentLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionBank>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            config: AssessmentConfig::default(),
            questions,
            attempts,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AssessmentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    /// Open a quiz for the subject.
    ///
    /// The returned session is `InProgress`, or `NoQuestions` when the bank has
    /// nothing for this subject.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Storage` if the question bank cannot be read.
    pub async fn start(&self, subject_id: SubjectId) -> Result<AssessmentSession, AssessmentError> {
        let mut session = AssessmentSession::loading(subject_id, self.config.clone(), self.clock);
        let mut questions = self.questions.get_questions(session.subject_id()).await?;
        if self.config.shuffle_questions() {
            questions.shuffle(&mut rng());
        }

        let state = session.load(questions);
        tracing::info!(
            subject_id = %session.subject_id(),
            questions = session.questions().len(),
            no_questions = matches!(state, AssessmentState::NoQuestions),
            time_limit_secs = self.config.time_limit_secs(),
            "assessment started"
        );
        Ok(session)
    }

    /// Persist the completed run. Calling again for the same run returns the
    /// stored id without writing twice.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NotCompleted` if the run has not finished.
    /// Returns `AssessmentError::Storage` if persistence fails.
    pub async fn finish(&self, session: &mut AssessmentSession) -> Result<i64, AssessmentError> {
        if let Some(id) = session.attempt_id() {
            return Ok(id);
        }

        let summary = session.summary()?;
        let id = self.attempts.append_attempt(&summary).await?;
        session.set_attempt_id(id);
        tracing::info!(
            subject_id = %summary.subject_id(),
            attempt_id = id,
            score = summary.score(),
            total = summary.total(),
            "attempt recorded"
        );
        Ok(id)
    }

    /// Most recent attempts for a subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Storage` if repository access fails.
    pub async fn recent_attempts(
        &self,
        subject_id: &SubjectId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, AssessmentError> {
        Ok(self.attempts.list_attempts(subject_id, limit).await?)
    }
}
