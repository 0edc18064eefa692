use std::fmt;
use std::sync::Arc;

use campus_core::Catalog;
use campus_core::model::{Course, CourseId, Entitlement, LessonId, MediaRef};

/// Whether a lesson may start playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackDecision {
    Play(MediaRef),
    /// The course is not purchased; render the locked overlay.
    Locked,
    /// The course is purchased but has no such lesson.
    UnknownLesson,
}

/// Single source of truth for purchased courses and lesson locks.
///
/// Operations are total: unknown course ids read as "not purchased" and
/// zero progress.
pub struct EntitlementStore {
    catalog: Arc<dyn Catalog + Send + Sync>,
    entitlement: Entitlement,
}

impl EntitlementStore {
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog + Send + Sync>, entitlement: Entitlement) -> Self {
        Self {
            catalog,
            entitlement,
        }
    }

    /// Marks a course as purchased. Call only after payment is confirmed.
    ///
    /// Returns `true` if the course was newly added.
    pub fn purchase(&mut self, course_id: CourseId) -> bool {
        self.entitlement.grant(course_id)
    }

    #[must_use]
    pub fn is_purchased(&self, course_id: &CourseId) -> bool {
        self.entitlement.contains(course_id)
    }

    /// Purchased courses in catalog order, as a fresh copy.
    #[must_use]
    pub fn purchased_courses(&self) -> Vec<Course> {
        self.catalog
            .list_courses()
            .iter()
            .filter(|c| self.is_purchased(c.id()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn is_course_locked(&self, course_id: &CourseId) -> bool {
        !self.is_purchased(course_id)
    }

    /// Course-wide lock: the lesson id does not affect the decision.
    #[must_use]
    pub fn is_lesson_locked(&self, course_id: &CourseId, _lesson_id: &LessonId) -> bool {
        self.is_course_locked(course_id)
    }

    /// Lesson-level lock that lets free-preview lessons through.
    ///
    /// Lessons the catalog does not know about stay locked for unpurchased courses.
    #[must_use]
    pub fn is_lesson_locked_with_preview(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
    ) -> bool {
        if self.is_purchased(course_id) {
            return false;
        }
        !self
            .catalog
            .get_course(course_id)
            .and_then(|c| c.lesson(lesson_id))
            .is_some_and(|l| l.is_preview())
    }

    /// Ratio of completed lessons in `[0, 1]`; `0.0` for unknown or empty courses.
    ///
    /// Purchase state does not influence progress.
    #[must_use]
    pub fn course_progress(&self, course_id: &CourseId) -> f64 {
        self.catalog
            .get_course(course_id)
            .map_or(0.0, Course::progress)
    }

    /// Playback gate for a lesson. The course lock dominates lesson state.
    #[must_use]
    pub fn playback(&self, course_id: &CourseId, lesson_id: &LessonId) -> PlaybackDecision {
        if self.is_lesson_locked(course_id, lesson_id) {
            return PlaybackDecision::Locked;
        }
        match self
            .catalog
            .get_course(course_id)
            .and_then(|c| c.lesson(lesson_id))
        {
            Some(lesson) => PlaybackDecision::Play(lesson.media().clone()),
            None => PlaybackDecision::UnknownLesson,
        }
    }

    /// Current purchased set, for host persistence.
    #[must_use]
    pub fn entitlement(&self) -> &Entitlement {
        &self.entitlement
    }

    #[must_use]
    pub fn catalog(&self) -> &(dyn Catalog + Send + Sync) {
        self.catalog.as_ref()
    }
}

impl fmt::Debug for EntitlementStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitlementStore")
            .field("courses_len", &self.catalog.list_courses().len())
            .field("entitlement", &self.entitlement)
            .finish()
    }
}
