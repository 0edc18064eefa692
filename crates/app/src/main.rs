use std::fmt;

use campus_core::Catalog;
use campus_core::model::{AssessmentConfig, CourseId, DEFAULT_TIME_LIMIT_SECS, LessonId, SubjectId};
use services::{AppServices, Clock, PlaybackDecision};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod quiz;
mod seed;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { command: &'static str, what: &'static str },
    UnknownArg(String),
    InvalidSeconds { raw: String },
    InvalidDbUrl { raw: String },
    InvalidId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { command, what } => {
                write!(f, "{command} requires a {what}")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeconds { raw } => write!(f, "invalid --seconds value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidId { raw } => write!(f, "invalid identifier: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- seed                         [options]");
    eprintln!("  cargo run -p app -- courses                      [options]");
    eprintln!("  cargo run -p app -- purchase <course-id>         [options]");
    eprintln!("  cargo run -p app -- play <course-id> <lesson-id> [options]");
    eprintln!("  cargo run -p app -- quiz <subject-id>            [options]");
    eprintln!("  cargo run -p app -- history <subject-id>         [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:campus.sqlite3)");
    eprintln!(
        "  --seconds <n>       Quiz time limit in seconds (default: {DEFAULT_TIME_LIMIT_SECS})"
    );
    eprintln!("  --shuffle           Shuffle question order");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CAMPUS_DB_URL, CAMPUS_QUIZ_SECONDS, CAMPUS_SHUFFLE, RUST_LOG");
    eprintln!("  A .env file in the working directory is loaded first.");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Seed,
    Courses,
    Purchase(CourseId),
    Play(CourseId, LessonId),
    Quiz(SubjectId),
    History(SubjectId),
}

#[derive(Debug)]
struct Args {
    command: Command,
    db_url: String,
    config: AssessmentConfig,
}

fn parse_id<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
    what: &'static str,
) -> Result<T, ArgsError> {
    let raw = args
        .next()
        .ok_or(ArgsError::MissingOperand { command, what })?;
    match raw.parse() {
        Ok(id) => Ok(id),
        Err(_) => Err(ArgsError::InvalidId { raw }),
    }
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let command = match args.next().as_deref() {
            None | Some("--help" | "-h") => return Ok(None),
            Some("seed") => Command::Seed,
            Some("courses") => Command::Courses,
            Some("purchase") => Command::Purchase(parse_id(&mut args, "purchase", "course id")?),
            Some("play") => Command::Play(
                parse_id(&mut args, "play", "course id")?,
                parse_id(&mut args, "play", "lesson id")?,
            ),
            Some("quiz") => Command::Quiz(parse_id(&mut args, "quiz", "subject id")?),
            Some("history") => Command::History(parse_id(&mut args, "history", "subject id")?),
            Some(other) => return Err(ArgsError::UnknownArg(other.to_owned())),
        };

        let mut db_url =
            std::env::var("CAMPUS_DB_URL").unwrap_or_else(|_| "sqlite:campus.sqlite3".into());
        let mut seconds = std::env::var("CAMPUS_QUIZ_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(DEFAULT_TIME_LIMIT_SECS);
        let mut shuffle = std::env::var("CAMPUS_SHUFFLE")
            .is_ok_and(|value| matches!(value.as_str(), "1" | "true" | "yes"));

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--seconds" => {
                    let value = require_value(&mut args, "--seconds")?;
                    seconds = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeconds { raw: value.clone() })?;
                }
                "--shuffle" => shuffle = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let config = AssessmentConfig::new(seconds, shuffle).map_err(|_| {
            ArgsError::InvalidSeconds {
                raw: seconds.to_string(),
            }
        })?;

        Ok(Some(Self {
            command,
            db_url: normalize_sqlite_url(db_url),
            config,
        }))
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}?mode=rwc", absolute.display())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let Some(args) = parsed else {
        print_usage();
        return Ok(());
    };

    tracing::debug!(db_url = %args.db_url, command = ?args.command, "starting");
    let app = AppServices::new_sqlite(&args.db_url, Clock::default_clock(), args.config).await?;

    match args.command {
        Command::Seed => seed::run(&app).await,
        Command::Courses => list_courses(&app).await,
        Command::Purchase(course_id) => purchase(&app, course_id).await,
        Command::Play(course_id, lesson_id) => play(&app, &course_id, &lesson_id).await,
        Command::Quiz(subject_id) => quiz::run(&app, subject_id).await,
        Command::History(subject_id) => history(&app, &subject_id).await,
    }
}

async fn list_courses(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let store = app.entitlements().load_store().await?;
    let courses = store.catalog().list_courses();
    if courses.is_empty() {
        println!("No courses yet. Run `seed` first.");
        return Ok(());
    }

    for course in courses {
        let status = if store.is_purchased(course.id()) {
            "owned"
        } else {
            "locked"
        };
        println!(
            "{:<6} {:<28} {:<18} {:>8} {:>4.0}% [{status}]",
            course.id(),
            course.title(),
            course.instructor(),
            course.price().to_string(),
            store.course_progress(course.id()) * 100.0,
        );
        for lesson in course.lessons() {
            let mark = if lesson.completed() { "x" } else { " " };
            let preview = if lesson.is_preview() { " (preview)" } else { "" };
            println!(
                "         [{mark}] {:<10} {} ({}m){preview}",
                lesson.id(),
                lesson.title(),
                lesson.duration_secs() / 60
            );
        }
    }
    Ok(())
}

async fn purchase(
    app: &AppServices,
    course_id: CourseId,
) -> Result<(), Box<dyn std::error::Error>> {
    let entitlements = app.entitlements();
    let mut store = entitlements.load_store().await?;
    let Some(course) = store.catalog().get_course(&course_id).cloned() else {
        println!("Unknown course {course_id}.");
        return Ok(());
    };

    if entitlements.confirm_purchase(&mut store, course_id).await? {
        println!("Purchased \"{}\" for {}.", course.title(), course.price());
    } else {
        println!("\"{}\" is already in your library.", course.title());
    }
    Ok(())
}

async fn play(
    app: &AppServices,
    course_id: &CourseId,
    lesson_id: &LessonId,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = app.entitlements().load_store().await?;
    match store.playback(course_id, lesson_id) {
        PlaybackDecision::Play(media) => println!("Playing {}", media.as_str()),
        PlaybackDecision::Locked => {
            if store.is_lesson_locked_with_preview(course_id, lesson_id) {
                println!("Content locked, purchase to unlock.");
            } else {
                println!(
                    "Content locked, purchase to unlock (free preview available in the catalog)."
                );
            }
        }
        PlaybackDecision::UnknownLesson => {
            println!("Lesson {lesson_id} not found in {course_id}.");
        }
    }
    Ok(())
}

async fn history(
    app: &AppServices,
    subject_id: &SubjectId,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = app.assessments().recent_attempts(subject_id, 20).await?;
    if rows.is_empty() {
        println!("No attempts for {subject_id} yet.");
        return Ok(());
    }
    for row in rows {
        let summary = &row.summary;
        println!(
            "#{:<4} {}  {}/{}  ({})",
            row.id,
            summary.completed_at().format("%Y-%m-%d %H:%M"),
            summary.score(),
            summary.total(),
            summary.completion().as_str()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info,storage=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_quiz_with_overrides() {
        let parsed = Args::parse(args(&[
            "quiz",
            "S1",
            "--seconds",
            "15",
            "--shuffle",
            "--db",
            "sqlite::memory:",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(parsed.command, Command::Quiz(SubjectId::new("S1")));
        assert_eq!(parsed.config.time_limit_secs(), 15);
        assert!(parsed.config.shuffle_questions());
        assert_eq!(parsed.db_url, "sqlite::memory:");
    }

    #[test]
    fn rejects_zero_seconds() {
        let err = Args::parse(args(&["quiz", "S1", "--seconds", "0"])).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidSeconds { .. }));
    }

    #[test]
    fn play_needs_both_ids() {
        let err = Args::parse(args(&["play", "C1"])).unwrap_err();
        assert_eq!(err.to_string(), "play requires a lesson id");
    }

    #[test]
    fn no_command_prints_usage() {
        assert!(Args::parse(args(&[])).unwrap().is_none());
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/campus.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/campus.db?mode=rwc"));
    }
}
