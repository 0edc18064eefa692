use campus_core::model::{
    AssessmentResult, AttemptSummary, Completion, Course, CourseId, Lesson, LessonId, MediaRef,
    Price, Question, QuestionId, SubjectId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{AttemptRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn usize_to_i64(field: &'static str, v: usize) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn parse_completion(s: &str) -> Result<Completion, StorageError> {
    match s {
        "answered" => Ok(Completion::Answered),
        "time_expired" => Ok(Completion::TimeExpired),
        _ => Err(StorageError::Serialization(format!("invalid completion: {s}"))),
    }
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let media = MediaRef::parse(row.try_get::<String, _>("media_url").map_err(ser)?).map_err(ser)?;
    let duration = i64_to_u32(
        "duration_secs",
        row.try_get::<i64, _>("duration_secs").map_err(ser)?,
    )?;

    let lesson = Lesson::new(
        LessonId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        duration,
        media,
    )
    .map_err(ser)?
    .with_completed(row.try_get::<bool, _>("completed").map_err(ser)?)
    .with_preview(row.try_get::<bool, _>("is_preview").map_err(ser)?);
    Ok(lesson)
}

pub(crate) fn map_course_row(
    row: &SqliteRow,
    lessons: Vec<Lesson>,
) -> Result<Course, StorageError> {
    let price = i64_to_u32("price_cents", row.try_get::<i64, _>("price_cents").map_err(ser)?)?;
    Course::new(
        CourseId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<String, _>("instructor").map_err(ser)?,
        Price::from_cents(price),
        lessons,
    )
    .map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let options_json: String = row.try_get("options_json").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct: i64 = row.try_get("correct_index").map_err(ser)?;
    let correct = usize::try_from(correct)
        .map_err(|_| StorageError::Serialization(format!("invalid correct_index: {correct}")))?;

    Question::new(
        QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?),
        row.try_get::<String, _>("prompt").map_err(ser)?,
        options,
        correct,
    )
    .map_err(ser)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<AttemptRow, StorageError> {
    let completion: String = row.try_get("completion").map_err(ser)?;
    let result = AssessmentResult {
        score: i64_to_u32("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        total: i64_to_u32("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
    };
    let summary = AttemptSummary::new(
        SubjectId::new(row.try_get::<String, _>("subject_id").map_err(ser)?),
        row.try_get("started_at").map_err(ser)?,
        row.try_get("completed_at").map_err(ser)?,
        result,
        parse_completion(&completion)?,
    )
    .map_err(ser)?;

    Ok(AttemptRow {
        id: row.try_get("id").map_err(ser)?,
        summary,
    })
}
