use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{CourseId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("media reference is not a valid URL: {0}")]
    InvalidMedia(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course instructor cannot be empty")]
    EmptyInstructor,

    #[error("lesson {0} appears more than once")]
    DuplicateLesson(LessonId),
}

//
// ─── VALUE TYPES ───────────────────────────────────────────────────────────────
//

/// Course price in minor currency units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u32);

impl Price {
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(cents)
    }

    #[must_use]
    pub fn cents(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Location of a lesson's playable media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(Url);

impl MediaRef {
    /// Parse a media reference from a URL string.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidMedia` if the value is not an absolute URL.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, LessonError> {
        let s = raw.as_ref().trim();
        Url::parse(s)
            .map(Self)
            .map_err(|_| LessonError::InvalidMedia(s.to_owned()))
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A single playable lesson of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    id: LessonId,
    title: String,
    duration_secs: u32,
    completed: bool,
    media: MediaRef,
    is_preview: bool,
}

impl Lesson {
    /// Creates a lesson that is neither completed nor a free preview.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is blank.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        duration_secs: u32,
        media: MediaRef,
    ) -> Result<Self, LessonError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            duration_secs,
            completed: false,
            media,
            is_preview: false,
        })
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[must_use]
    pub fn with_preview(mut self, is_preview: bool) -> Self {
        self.is_preview = is_preview;
        self
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn media(&self) -> &MediaRef {
        &self.media
    }

    /// Whether the lesson is flagged as a free preview.
    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.is_preview
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A catalog course with its ordered lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    id: CourseId,
    title: String,
    instructor: String,
    price: Price,
    lessons: Vec<Lesson>,
}

impl Course {
    /// Creates a validated course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` for a blank title or instructor, or when two
    /// lessons share an id.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        instructor: impl Into<String>,
        price: Price,
        lessons: Vec<Lesson>,
    ) -> Result<Self, CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        let instructor = instructor.into().trim().to_owned();
        if instructor.is_empty() {
            return Err(CourseError::EmptyInstructor);
        }

        let mut seen = HashSet::with_capacity(lessons.len());
        for lesson in &lessons {
            if !seen.insert(lesson.id()) {
                return Err(CourseError::DuplicateLesson(lesson.id().clone()));
            }
        }

        Ok(Self {
            id,
            title,
            instructor,
            price,
            lessons,
        })
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn instructor(&self) -> &str {
        &self.instructor
    }

    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id() == id)
    }

    #[must_use]
    pub fn completed_lessons(&self) -> usize {
        self.lessons.iter().filter(|l| l.completed()).count()
    }

    /// Ratio of completed lessons, in `[0, 1]`.
    ///
    /// A course without lessons reports `0.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.lessons.is_empty() {
            return 0.0;
        }
        self.completed_lessons() as f64 / self.lessons.len() as f64
    }

    /// Total runtime of all lessons, in seconds.
    #[must_use]
    pub fn total_duration_secs(&self) -> u64 {
        self.lessons.iter().map(|l| u64::from(l.duration_secs())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: &str, completed: bool) -> Lesson {
        Lesson::new(
            LessonId::new(id),
            format!("Lesson {id}"),
            300,
            MediaRef::parse("https://cdn.example.com/v/1.mp4").unwrap(),
        )
        .unwrap()
        .with_completed(completed)
    }

    #[test]
    fn progress_is_completed_ratio() {
        let course = Course::new(
            CourseId::new("C1"),
            "Algebra",
            "Dr. Rao",
            Price::from_cents(4999),
            vec![lesson("l1", true), lesson("l2", false), lesson("l3", false)],
        )
        .unwrap();

        assert!((course.progress() - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(course.completed_lessons(), 1);
        assert_eq!(course.total_duration_secs(), 900);
    }

    #[test]
    fn progress_of_empty_course_is_zero() {
        let course =
            Course::new(CourseId::new("C0"), "Intro", "Staff", Price::default(), vec![]).unwrap();
        assert_eq!(course.progress(), 0.0);
    }

    #[test]
    fn progress_is_one_when_all_completed() {
        let course = Course::new(
            CourseId::new("C2"),
            "Physics",
            "Staff",
            Price::from_cents(100),
            vec![lesson("a", true), lesson("b", true)],
        )
        .unwrap();
        assert_eq!(course.progress(), 1.0);
    }

    #[test]
    fn rejects_duplicate_lessons() {
        let err = Course::new(
            CourseId::new("C3"),
            "Dup",
            "Staff",
            Price::default(),
            vec![lesson("x", false), lesson("x", true)],
        )
        .unwrap_err();
        assert_eq!(err, CourseError::DuplicateLesson(LessonId::new("x")));
    }

    #[test]
    fn rejects_blank_fields() {
        let err = Course::new(CourseId::new("C4"), "  ", "Staff", Price::default(), vec![])
            .unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);

        let err = Course::new(CourseId::new("C4"), "T", "", Price::default(), vec![]).unwrap_err();
        assert_eq!(err, CourseError::EmptyInstructor);
    }

    #[test]
    fn media_ref_requires_url() {
        assert!(MediaRef::parse("not a url").is_err());
        let media = MediaRef::parse(" https://cdn.example.com/a.m3u8 ").unwrap();
        assert_eq!(media.as_str(), "https://cdn.example.com/a.m3u8");
    }

    #[test]
    fn price_formats_in_major_units() {
        assert_eq!(Price::from_cents(4999).to_string(), "49.99");
        assert!(Price::from_cents(0).is_free());
    }
}
