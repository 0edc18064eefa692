mod assessment;
mod attempt;
mod course;
mod entitlement;
mod ids;
mod question;

pub use ids::{CourseId, LessonId, ParseIdError, QuestionId, SubjectId};

pub use assessment::{AssessmentConfig, AssessmentConfigError, DEFAULT_TIME_LIMIT_SECS};
pub use attempt::{AssessmentResult, AttemptError, AttemptSummary, Completion};
pub use course::{Course, CourseError, Lesson, LessonError, MediaRef, Price};
pub use entitlement::Entitlement;
pub use question::{Question, QuestionError};
