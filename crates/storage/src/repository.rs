use async_trait::async_trait;
use chrono::{DateTime, Utc};
use campus_core::model::{AttemptSummary, Course, CourseId, Question, SubjectId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A recorded purchase, as persisted after payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRecord {
    pub course_id: CourseId,
    pub purchased_at: DateTime<Utc>,
}

/// Persisted attempt with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: i64,
    pub summary: AttemptSummary,
}

/// Repository contract for the course catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persist or replace a course and its lessons.
    ///
    /// New courses are appended to the end of the catalog order; replacing an
    /// existing course keeps its position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by id.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError>;

    /// List all courses in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;
}

/// Read-only source of quiz questions keyed by subject.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Ordered questions for a subject. Unknown subjects yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_questions(&self, subject_id: &SubjectId) -> Result<Vec<Question>, StorageError>;

    /// Replace the full question list of a subject (authoring and seeding).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be stored.
    async fn replace_questions(
        &self,
        subject_id: &SubjectId,
        questions: &[Question],
    ) -> Result<(), StorageError>;
}

/// Persistence for the purchased-course set.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Record a purchase. Recording the same course twice keeps the first record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the purchase cannot be stored.
    async fn record_purchase(&self, record: &PurchaseRecord) -> Result<(), StorageError>;

    /// All purchased course ids. Order is not significant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn purchased_ids(&self) -> Result<Vec<CourseId>, StorageError>;
}

/// Append-only history of finished quiz attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append an attempt and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &AttemptSummary) -> Result<i64, StorageError>;

    /// Fetch an attempt by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: i64) -> Result<AttemptSummary, StorageError>;

    /// Most recent attempts for a subject, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_attempts(
        &self,
        subject_id: &SubjectId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<Vec<Course>>>,
    questions: Arc<Mutex<HashMap<SubjectId, Vec<Question>>>>,
    purchases: Arc<Mutex<HashMap<CourseId, DateTime<Utc>>>>,
    attempts: Arc<Mutex<BTreeMap<i64, AttemptSummary>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl CatalogRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        match guard.iter_mut().find(|c| c.id() == course.id()) {
            Some(existing) => *existing = course.clone(),
            None => guard.push(course.clone()),
        }
        Ok(())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|c| c.id() == id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl QuestionBank for InMemoryRepository {
    async fn get_questions(&self, subject_id: &SubjectId) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.get(subject_id).cloned().unwrap_or_default())
    }

    async fn replace_questions(
        &self,
        subject_id: &SubjectId,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut seen = HashSet::with_capacity(questions.len());
        if !questions.iter().all(|q| seen.insert(q.id())) {
            return Err(StorageError::Conflict);
        }
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.insert(subject_id.clone(), questions.to_vec());
        Ok(())
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryRepository {
    async fn record_purchase(&self, record: &PurchaseRecord) -> Result<(), StorageError> {
        let mut guard = self.purchases.lock().map_err(poisoned)?;
        guard
            .entry(record.course_id.clone())
            .or_insert(record.purchased_at);
        Ok(())
    }

    async fn purchased_ids(&self) -> Result<Vec<CourseId>, StorageError> {
        let guard = self.purchases.lock().map_err(poisoned)?;
        Ok(guard.keys().cloned().collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &AttemptSummary) -> Result<i64, StorageError> {
        let mut guard = self.attempts.lock().map_err(poisoned)?;
        let id = guard.keys().next_back().map_or(1, |last| last + 1);
        guard.insert(id, attempt.clone());
        Ok(id)
    }

    async fn get_attempt(&self, id: i64) -> Result<AttemptSummary, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        subject_id: &SubjectId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows: Vec<AttemptRow> = guard
            .iter()
            .filter(|(_, a)| a.subject_id() == subject_id)
            .map(|(id, a)| AttemptRow {
                id: *id,
                summary: a.clone(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.summary
                .completed_at()
                .cmp(&a.summary.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub catalog: Arc<dyn CatalogRepository>,
    pub questions: Arc<dyn QuestionBank>,
    pub entitlements: Arc<dyn EntitlementRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            catalog: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            entitlements: Arc::new(repo.clone()),
            attempts: Arc::new(repo),
        }
    }
}
