use chrono::Duration;
use campus_core::model::{
    AssessmentResult, AttemptSummary, Completion, Course, CourseId, Lesson, LessonId, MediaRef,
    Price, Question, QuestionId, SubjectId,
};
use campus_core::time::fixed_now;
use storage::repository::{
    AttemptRepository, CatalogRepository, EntitlementRepository, PurchaseRecord, QuestionBank,
    StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn build_lesson(id: &str, completed: bool, preview: bool) -> Lesson {
    Lesson::new(
        LessonId::new(id),
        format!("Lesson {id}"),
        600,
        MediaRef::parse(format!("https://cdn.example.com/{id}.mp4")).unwrap(),
    )
    .unwrap()
    .with_completed(completed)
    .with_preview(preview)
}

fn build_course(id: &str, lessons: Vec<Lesson>) -> Course {
    Course::new(
        CourseId::new(id),
        format!("Course {id}"),
        "Ms. Okafor",
        Price::from_cents(2500),
        lessons,
    )
    .unwrap()
}

fn build_question(id: &str, correct: usize) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Prompt {id}"),
        vec!["a".into(), "b".into(), "c".into()],
        correct,
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_catalog_preserves_order_and_lessons() {
    let repo = connect("memdb_catalog").await;

    let c2 = build_course(
        "C2",
        vec![
            build_lesson("intro", true, true),
            build_lesson("deep", false, false),
        ],
    );
    let c1 = build_course("C1", vec![build_lesson("only", false, false)]);
    repo.upsert_course(&c2).await.unwrap();
    repo.upsert_course(&c1).await.unwrap();

    let listed = repo.list_courses().await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id().as_str()).collect();
    assert_eq!(ids, ["C2", "C1"]);
    assert_eq!(listed[0], c2);

    let fetched = repo.get_course(&CourseId::new("C2")).await.unwrap().unwrap();
    assert!(fetched.lessons()[0].is_preview());
    assert!(fetched.lessons()[0].completed());
    assert_eq!(fetched.lessons()[1].id().as_str(), "deep");

    assert!(repo.get_course(&CourseId::new("missing")).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_upsert_replaces_lessons_in_place() {
    let repo = connect("memdb_upsert").await;

    repo.upsert_course(&build_course("A", vec![build_lesson("x", false, false)]))
        .await
        .unwrap();
    repo.upsert_course(&build_course("B", vec![])).await.unwrap();
    repo.upsert_course(&build_course(
        "A",
        vec![build_lesson("y", true, false), build_lesson("z", false, false)],
    ))
    .await
    .unwrap();

    let listed = repo.list_courses().await.unwrap();
    assert_eq!(listed[0].id().as_str(), "A");
    let lesson_ids: Vec<_> = listed[0].lessons().iter().map(|l| l.id().as_str()).collect();
    assert_eq!(lesson_ids, ["y", "z"]);
    assert!(listed[1].lessons().is_empty());
}

#[tokio::test]
async fn sqlite_question_bank_round_trips_options() {
    let repo = connect("memdb_questions").await;
    let subject = SubjectId::new("S1");
    let questions = vec![
        build_question("q1", 1),
        build_question("q2", 2),
        build_question("q3", 0),
    ];
    repo.replace_questions(&subject, &questions).await.unwrap();

    let fetched = repo.get_questions(&subject).await.unwrap();
    assert_eq!(fetched, questions);
    assert!(repo.get_questions(&SubjectId::new("none")).await.unwrap().is_empty());

    repo.replace_questions(&subject, &questions[..1]).await.unwrap();
    assert_eq!(repo.get_questions(&subject).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_rejects_duplicate_question_ids() {
    let repo = connect("memdb_dup_questions").await;
    let result = repo
        .replace_questions(
            &SubjectId::new("S1"),
            &[build_question("q1", 0), build_question("q1", 1)],
        )
        .await;
    assert!(matches!(result, Err(StorageError::Conflict)));
}

#[tokio::test]
async fn sqlite_purchases_are_idempotent() {
    let repo = connect("memdb_purchases").await;
    let record = PurchaseRecord {
        course_id: CourseId::new("C1"),
        purchased_at: fixed_now(),
    };
    repo.record_purchase(&record).await.unwrap();
    repo.record_purchase(&PurchaseRecord {
        purchased_at: fixed_now() + Duration::days(1),
        ..record.clone()
    })
    .await
    .unwrap();

    assert_eq!(repo.purchased_ids().await.unwrap(), vec![CourseId::new("C1")]);
}

#[tokio::test]
async fn sqlite_attempts_list_newest_first() {
    let repo = connect("memdb_attempts").await;
    let subject = SubjectId::new("S1");
    let now = fixed_now();

    let first = AttemptSummary::new(
        subject.clone(),
        now,
        now + Duration::seconds(40),
        AssessmentResult { score: 2, total: 3 },
        Completion::Answered,
    )
    .unwrap();
    let second = AttemptSummary::new(
        subject.clone(),
        now + Duration::minutes(5),
        now + Duration::minutes(6),
        AssessmentResult { score: 0, total: 3 },
        Completion::TimeExpired,
    )
    .unwrap();
    let first_id = repo.append_attempt(&first).await.unwrap();
    let second_id = repo.append_attempt(&second).await.unwrap();

    let rows = repo.list_attempts(&subject, 10).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, [second_id, first_id]);
    assert_eq!(rows[0].summary, second);

    assert_eq!(repo.get_attempt(first_id).await.unwrap(), first);
    assert!(matches!(
        repo.get_attempt(9_999).await,
        Err(StorageError::NotFound)
    ));
}
