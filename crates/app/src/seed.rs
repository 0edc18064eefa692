use campus_core::model::{
    Course, CourseId, Lesson, LessonId, MediaRef, Price, Question, QuestionId, SubjectId,
};
use services::AppServices;
use storage::repository::{CatalogRepository, QuestionBank};

/// (id, title, instructor, price in cents, lessons as (id, title, minutes, completed, preview))
type CourseSeed = (
    &'static str,
    &'static str,
    &'static str,
    u32,
    &'static [(&'static str, &'static str, u32, bool, bool)],
);

const COURSES: &[CourseSeed] = &[
    (
        "C1",
        "Algebra Foundations",
        "Dr. Meera Rao",
        4999,
        &[
            ("alg-1", "Variables and expressions", 12, true, true),
            ("alg-2", "Linear equations", 18, false, false),
            ("alg-3", "Inequalities", 15, false, false),
        ],
    ),
    (
        "C2",
        "Intro to Chemistry",
        "Ms. Hana Park",
        2999,
        &[
            ("chem-1", "Atoms and elements", 10, false, true),
            ("chem-2", "The periodic table", 22, false, false),
        ],
    ),
    (
        "C3",
        "Study Skills",
        "Campus Staff",
        0,
        &[("study-1", "Planning your week", 8, false, false)],
    ),
];

/// (subject, [(prompt, options, correct)])
type SubjectSeed = (
    &'static str,
    &'static [(&'static str, &'static [&'static str], usize)],
);

const SUBJECTS: &[SubjectSeed] = &[
    (
        "math",
        &[
            ("What is 7 x 8?", &["54", "56", "64", "58"], 1),
            ("Solve for x: 2x + 4 = 10", &["2", "4", "3", "5"], 2),
            ("Which is a prime number?", &["17", "21", "27", "33"], 0),
        ],
    ),
    (
        "science",
        &[
            ("Chemical symbol for sodium?", &["So", "Sd", "Na", "S"], 2),
            ("Which planet is closest to the sun?", &["Venus", "Mercury", "Mars"], 1),
        ],
    ),
];

fn build_course(seed: &CourseSeed) -> Result<Course, campus_core::Error> {
    let (id, title, instructor, cents, lessons) = *seed;
    let lessons = lessons
        .iter()
        .map(|&(lesson_id, lesson_title, minutes, completed, preview)| {
            let media = MediaRef::parse(format!(
                "https://media.campus.example/{id}/{lesson_id}/index.m3u8"
            ))?;
            Ok(Lesson::new(LessonId::new(lesson_id), lesson_title, minutes * 60, media)?
                .with_completed(completed)
                .with_preview(preview))
        })
        .collect::<Result<Vec<_>, campus_core::model::LessonError>>()?;
    Ok(Course::new(
        CourseId::new(id),
        title,
        instructor,
        Price::from_cents(cents),
        lessons,
    )?)
}

fn build_questions(
    subject: &str,
    items: &[(&str, &[&str], usize)],
) -> Result<Vec<Question>, campus_core::Error> {
    let questions = items
        .iter()
        .enumerate()
        .map(|(i, &(prompt, options, correct))| {
            Question::new(
                QuestionId::new(format!("{subject}-{}", i + 1)),
                prompt,
                options.iter().map(|o| (*o).to_string()).collect(),
                correct,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

/// Upsert the demo catalog and question bank.
pub async fn run(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let storage = app.storage();

    for seed in COURSES {
        let course = build_course(seed)?;
        storage.catalog.upsert_course(&course).await?;
    }

    let mut question_count = 0;
    for &(subject, items) in SUBJECTS {
        let questions = build_questions(subject, items)?;
        question_count += questions.len();
        storage
            .questions
            .replace_questions(&SubjectId::new(subject), &questions)
            .await?;
    }

    tracing::info!(
        courses = COURSES.len(),
        subjects = SUBJECTS.len(),
        questions = question_count,
        "seeded demo data"
    );
    println!(
        "Seeded {} courses and {} questions across {} subjects.",
        COURSES.len(),
        question_count,
        SUBJECTS.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_data_is_valid() {
        for seed in COURSES {
            build_course(seed).unwrap();
        }
        for &(subject, items) in SUBJECTS {
            assert!(!build_questions(subject, items).unwrap().is_empty());
        }
    }

    #[test]
    fn invalid_question_reports_domain_error() {
        let options: &[&str] = &["only"];
        let err = build_questions("math", &[("Pick one", options, 0)]).unwrap_err();
        assert!(matches!(err, campus_core::Error::Question(_)));
    }
}
