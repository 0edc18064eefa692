use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use campus_core::model::{
    AssessmentConfig, AssessmentResult, AttemptSummary, Completion, Question, QuestionId,
    SubjectId,
};

use super::progress::AssessmentProgress;
use crate::Clock;
use crate::error::AssessmentError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "completion", rename_all = "snake_case")]
pub enum AssessmentState {
    /// Questions are being fetched.
    Loading,
    InProgress,
    Completed(Completion),
    /// The bank had no questions for the subject. Terminal, and distinct from
    /// a completed 0/0 run.
    NoQuestions,
}

/// What an `advance` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Not in progress, or nothing selected.
    Ignored,
    /// Moved on to the next question.
    Next,
    /// The last question was answered.
    Completed,
}

/// Recorded answer for one question of the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected: usize,
    pub correct: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed, scored attempt at a subject's quiz.
///
/// The session never owns a timer: the host calls [`AssessmentSession::tick`]
/// once per elapsed second. Calls that do not fit the current state are
/// ignored rather than treated as errors, so stale UI handlers are harmless.
pub struct AssessmentSession {
    subject_id: SubjectId,
    config: AssessmentConfig,
    clock: Clock,
    questions: Vec<Question>,
    state: AssessmentState,
    current: usize,
    selected: Option<usize>,
    score: u32,
    time_remaining: u32,
    answers: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    attempt_id: Option<i64>,
}

impl AssessmentSession {
    /// Create a session in `Loading` state, before its questions arrive.
    #[must_use]
    pub fn loading(subject_id: SubjectId, config: AssessmentConfig, clock: Clock) -> Self {
        let time_remaining = config.time_limit_secs();
        Self {
            subject_id,
            config,
            clock,
            questions: Vec::new(),
            state: AssessmentState::Loading,
            current: 0,
            selected: None,
            score: 0,
            time_remaining,
            answers: Vec::new(),
            started_at: clock.now(),
            completed_at: None,
            attempt_id: None,
        }
    }

    /// Create a session and load its questions in one step.
    #[must_use]
    pub fn start(
        subject_id: SubjectId,
        questions: Vec<Question>,
        config: AssessmentConfig,
        clock: Clock,
    ) -> Self {
        let mut session = Self::loading(subject_id, config, clock);
        session.load(questions);
        session
    }

    /// Hand the fetched questions to a `Loading` session.
    ///
    /// An empty list moves the session to `NoQuestions`. Ignored outside `Loading`.
    pub fn load(&mut self, questions: Vec<Question>) -> AssessmentState {
        if self.state != AssessmentState::Loading {
            return self.state;
        }
        if questions.is_empty() {
            tracing::debug!(subject_id = %self.subject_id, "no questions for subject");
            self.state = AssessmentState::NoQuestions;
            return self.state;
        }
        self.questions = questions;
        self.reset();
        self.state
    }

    /// Start over with the same questions. Valid from `InProgress` or `Completed`.
    ///
    /// Returns `false` if the call was ignored.
    pub fn restart(&mut self) -> bool {
        match self.state {
            AssessmentState::InProgress | AssessmentState::Completed(_) => {
                self.reset();
                true
            }
            AssessmentState::Loading | AssessmentState::NoQuestions => false,
        }
    }

    fn reset(&mut self) {
        self.current = 0;
        self.selected = None;
        self.score = 0;
        self.time_remaining = self.config.time_limit_secs();
        self.answers.clear();
        self.started_at = self.clock.now();
        self.completed_at = None;
        self.attempt_id = None;
        self.state = AssessmentState::InProgress;
    }

    /// Count down one second. Expiry completes the run immediately; an
    /// unanswered current question is not scored.
    ///
    /// Returns the seconds left. Ignored outside `InProgress`.
    pub fn tick(&mut self) -> u32 {
        if self.state != AssessmentState::InProgress {
            return self.time_remaining;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.clock.advance(chrono::Duration::seconds(1));
        if self.time_remaining == 0 {
            self.complete(Completion::TimeExpired);
        }
        self.time_remaining
    }

    /// Select an option for the current question, replacing any earlier choice.
    ///
    /// Returns `false` if ignored (not in progress, or no such option).
    pub fn select_option(&mut self, option_index: usize) -> bool {
        if self.state != AssessmentState::InProgress {
            return false;
        }
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };
        if !question.has_option(option_index) {
            return false;
        }
        self.selected = Some(option_index);
        true
    }

    /// Score the current selection and move on.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.state != AssessmentState::InProgress {
            return AdvanceOutcome::Ignored;
        }
        let Some(selected) = self.selected else {
            return AdvanceOutcome::Ignored;
        };
        let Some(question) = self.questions.get(self.current) else {
            return AdvanceOutcome::Ignored;
        };

        let correct = question.is_correct(selected);
        if correct {
            self.score = self.score.saturating_add(1);
        }
        self.answers.push(AnswerRecord {
            question_id: question.id().clone(),
            selected,
            correct,
        });

        if self.current + 1 >= self.questions.len() {
            self.complete(Completion::Answered);
            return AdvanceOutcome::Completed;
        }
        self.current += 1;
        self.selected = None;
        AdvanceOutcome::Next
    }

    fn complete(&mut self, completion: Completion) {
        self.state = AssessmentState::Completed(completion);
        self.selected = None;
        self.completed_at = Some(self.clock.now());
        tracing::debug!(
            subject_id = %self.subject_id,
            score = self.score,
            total = self.total(),
            completion = completion.as_str(),
            "assessment completed"
        );
    }

    /// Final score. `None` unless the session is `Completed`.
    #[must_use]
    pub fn result(&self) -> Option<AssessmentResult> {
        match self.state {
            AssessmentState::Completed(_) => Some(AssessmentResult {
                score: self.score,
                total: self.total(),
            }),
            _ => None,
        }
    }

    /// Build the persisted record of this run.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::NotCompleted` unless the session is `Completed`.
    pub fn summary(&self) -> Result<AttemptSummary, AssessmentError> {
        let (AssessmentState::Completed(completion), Some(completed_at), Some(result)) =
            (self.state, self.completed_at, self.result())
        else {
            return Err(AssessmentError::NotCompleted);
        };
        Ok(AttemptSummary::new(
            self.subject_id.clone(),
            self.started_at,
            completed_at,
            result,
            completion,
        )?)
    }

    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    #[must_use]
    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> AssessmentState {
        self.state
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.state, AssessmentState::Completed(_))
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// The question being answered, while in progress.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.state != AssessmentState::InProgress {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Storage id of this run's attempt, once persisted.
    #[must_use]
    pub fn attempt_id(&self) -> Option<i64> {
        self.attempt_id
    }

    pub(crate) fn set_attempt_id(&mut self, id: i64) {
        self.attempt_id = Some(id);
    }

    #[must_use]
    pub fn progress(&self) -> AssessmentProgress {
        AssessmentProgress {
            state: self.state,
            index: self.current,
            total: self.questions.len(),
            answered: self.answers.len(),
            score: self.score,
            time_remaining: self.time_remaining,
            selected: self.selected,
        }
    }
}

impl fmt::Debug for AssessmentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssessmentSession")
            .field("subject_id", &self.subject_id)
            .field("state", &self.state)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("time_remaining", &self.time_remaining)
            .field("attempt_id", &self.attempt_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use campus_core::time::fixed_now;

    fn build_questions(correct: &[usize]) -> Vec<Question> {
        correct
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Question {i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    c,
                )
                .unwrap()
            })
            .collect()
    }

    fn start(correct: &[usize]) -> AssessmentSession {
        AssessmentSession::start(
            SubjectId::new("S1"),
            build_questions(correct),
            AssessmentConfig::default(),
            Clock::fixed(fixed_now()),
        )
    }

    #[test]
    fn start_initializes_fresh_run() {
        let session = start(&[1, 2, 0]);
        assert_eq!(session.state(), AssessmentState::InProgress);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.selected(), None);
        assert_eq!(session.time_remaining(), 60);
        assert_eq!(session.result(), None);
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let mut session = start(&[1, 2, 0]);
        for answer in [1, 2, 0] {
            assert!(session.select_option(answer));
            session.advance();
        }
        assert_eq!(
            session.state(),
            AssessmentState::Completed(Completion::Answered)
        );
        assert_eq!(session.result(), Some(AssessmentResult { score: 3, total: 3 }));
        assert!(session.answers().iter().all(|a| a.correct));
    }

    #[test]
    fn changing_selection_before_advance_overwrites() {
        let mut session = start(&[1, 2]);
        session.select_option(0);
        session.select_option(1);
        assert_eq!(session.advance(), AdvanceOutcome::Next);
        assert_eq!(session.score(), 1);
        assert_eq!(session.selected(), None);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn wrong_answers_are_not_scored() {
        let mut session = start(&[1, 2]);
        session.select_option(0);
        session.advance();
        session.select_option(2);
        assert_eq!(session.advance(), AdvanceOutcome::Completed);
        assert_eq!(session.result(), Some(AssessmentResult { score: 1, total: 2 }));
        assert!(!session.answers()[0].correct);
    }

    #[test]
    fn advance_without_selection_is_ignored() {
        let mut session = start(&[1, 2]);
        assert_eq!(session.advance(), AdvanceOutcome::Ignored);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut session = start(&[1]);
        assert!(!session.select_option(3));
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn timer_expiry_truncates_without_answers() {
        let mut session = start(&[1, 2, 0]);
        for _ in 0..59 {
            session.tick();
        }
        assert_eq!(session.state(), AssessmentState::InProgress);
        assert_eq!(session.tick(), 0);
        assert_eq!(
            session.state(),
            AssessmentState::Completed(Completion::TimeExpired)
        );
        assert_eq!(session.result(), Some(AssessmentResult { score: 0, total: 3 }));
    }

    #[test]
    fn timer_expiry_does_not_score_pending_selection() {
        let mut session = start(&[1, 2]);
        session.select_option(1);
        session.advance();
        session.select_option(2);
        for _ in 0..60 {
            session.tick();
        }
        assert_eq!(session.result(), Some(AssessmentResult { score: 1, total: 2 }));
    }

    #[test]
    fn calls_after_completion_are_ignored() {
        let mut session = start(&[0]);
        session.select_option(0);
        session.advance();

        assert!(!session.select_option(1));
        assert_eq!(session.advance(), AdvanceOutcome::Ignored);
        let remaining = session.time_remaining();
        assert_eq!(session.tick(), remaining);
        assert_eq!(session.result(), Some(AssessmentResult { score: 1, total: 1 }));
    }

    #[test]
    fn restart_resets_and_hides_result() {
        let mut session = start(&[1, 2, 0]);
        session.select_option(1);
        session.advance();
        for _ in 0..60 {
            session.tick();
        }
        assert!(session.is_completed());

        assert!(session.restart());
        assert_eq!(session.state(), AssessmentState::InProgress);
        assert_eq!(session.result(), None);
        assert!(session.answers().is_empty());
        assert_eq!(session.time_remaining(), 60);

        for _ in 0..60 {
            session.tick();
        }
        assert_eq!(session.result(), Some(AssessmentResult { score: 0, total: 3 }));
    }

    #[test]
    fn restart_mid_run_keeps_questions() {
        let mut session = start(&[1, 2]);
        session.select_option(1);
        session.advance();
        session.tick();

        assert!(session.restart());
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.questions().len(), 2);
        assert_eq!(session.time_remaining(), 60);
    }

    #[test]
    fn empty_bank_is_not_completed() {
        let mut session = AssessmentSession::start(
            SubjectId::new("empty"),
            Vec::new(),
            AssessmentConfig::default(),
            Clock::fixed(fixed_now()),
        );
        assert_eq!(session.state(), AssessmentState::NoQuestions);
        assert_eq!(session.result(), None);
        assert!(!session.restart());
        assert!(!session.select_option(0));
        assert_eq!(session.tick(), 60);
        assert!(matches!(session.summary(), Err(AssessmentError::NotCompleted)));
    }

    #[test]
    fn loading_session_ignores_interaction() {
        let mut session = AssessmentSession::loading(
            SubjectId::new("S1"),
            AssessmentConfig::default(),
            Clock::fixed(fixed_now()),
        );
        assert_eq!(session.state(), AssessmentState::Loading);
        assert!(!session.select_option(0));
        assert_eq!(session.advance(), AdvanceOutcome::Ignored);
        assert!(!session.restart());

        assert_eq!(session.load(build_questions(&[0])), AssessmentState::InProgress);
        assert_eq!(
            session.load(Vec::new()),
            AssessmentState::InProgress,
            "second load is ignored"
        );
    }

    #[test]
    fn summary_spans_elapsed_ticks() {
        let mut session = start(&[0, 1]);
        for _ in 0..5 {
            session.tick();
        }
        session.select_option(0);
        session.advance();
        session.select_option(1);
        session.advance();

        let summary = session.summary().unwrap();
        assert_eq!(summary.score(), 2);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.completion(), Completion::Answered);
        assert_eq!(
            summary.completed_at() - summary.started_at(),
            chrono::Duration::seconds(5)
        );
    }

    #[test]
    fn custom_time_limit_is_honored() {
        let mut session = AssessmentSession::start(
            SubjectId::new("S1"),
            build_questions(&[0]),
            AssessmentConfig::new(3, false).unwrap(),
            Clock::fixed(fixed_now()),
        );
        session.tick();
        session.tick();
        assert_eq!(session.state(), AssessmentState::InProgress);
        session.tick();
        assert!(session.is_completed());
    }

    #[test]
    fn progress_tracks_the_run() {
        let mut session = start(&[1, 2]);
        session.select_option(0);
        session.tick();
        assert_eq!(
            session.progress(),
            AssessmentProgress {
                state: AssessmentState::InProgress,
                index: 0,
                total: 2,
                answered: 0,
                score: 0,
                time_remaining: 59,
                selected: Some(0),
            }
        );

        session.select_option(1);
        assert_eq!(session.advance(), AdvanceOutcome::Next);
        let progress = session.progress();
        assert_eq!((progress.index, progress.answered, progress.score), (1, 1, 1));
        assert_eq!(progress.selected, None);

        for _ in 0..59 {
            session.tick();
        }
        let progress = session.progress();
        assert_eq!(progress.state, AssessmentState::Completed(Completion::TimeExpired));
        assert_eq!((progress.answered, progress.score, progress.time_remaining), (1, 1, 0));

        assert!(session.restart());
        let progress = session.progress();
        assert_eq!(progress.state, AssessmentState::InProgress);
        assert_eq!((progress.index, progress.answered, progress.score), (0, 0, 0));
        assert_eq!(progress.time_remaining, 60);
    }

    #[test]
    fn progress_serializes_state_with_completion() {
        let mut session = start(&[0]);
        let json = serde_json::to_value(session.progress()).unwrap();
        assert_eq!(json["state"], serde_json::json!({ "state": "in_progress" }));

        session.select_option(0);
        session.advance();
        let json = serde_json::to_value(session.progress()).unwrap();
        assert_eq!(
            json["state"],
            serde_json::json!({ "state": "completed", "completion": "answered" })
        );
        assert_eq!(json["score"], 1);
        assert_eq!(json["selected"], serde_json::Value::Null);
    }
}
