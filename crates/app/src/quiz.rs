use std::time::Duration;

use campus_core::model::SubjectId;
use services::{AdvanceOutcome, AppServices, AssessmentSession, AssessmentState};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run a quiz in the terminal. A one-second interval drives the session timer.
pub async fn run(
    app: &AppServices,
    subject_id: SubjectId,
) -> Result<(), Box<dyn std::error::Error>> {
    let assessments = app.assessments();
    let mut session = assessments.start(subject_id).await?;
    if session.state() == AssessmentState::NoQuestions {
        println!("No questions available for {}.", session.subject_id());
        return Ok(());
    }

    let progress = session.progress();
    println!(
        "{} questions, {}s on the clock.",
        progress.total, progress.time_remaining
    );
    println!("Type an option number to answer, `r` to restart, `q` to quit.");
    render_question(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    // The first tick fires immediately.
    ticker.tick().await;

    loop {
        if session.is_completed() {
            report(&session);
            let attempt_id = assessments.finish(&mut session).await?;
            tracing::debug!(attempt_id, "attempt saved");
            println!("Type `r` to try again, anything else to exit.");
            match lines.next_line().await? {
                Some(line) if line.trim() == "r" => {
                    session.restart();
                    ticker.reset();
                    render_question(&session);
                    continue;
                }
                _ => return Ok(()),
            }
        }

        tokio::select! {
            _ = ticker.tick() => {
                let left = session.tick();
                if left > 0 && (left % 10 == 0 || left <= 5) {
                    println!("  {left}s left");
                }
                if left == 0 {
                    println!("Time is up!");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    println!("Quiz abandoned.");
                    return Ok(());
                };
                match line.trim() {
                    "q" => {
                        println!("Quiz abandoned.");
                        return Ok(());
                    }
                    "r" => {
                        session.restart();
                        ticker.reset();
                        render_question(&session);
                    }
                    input => answer(&mut session, input),
                }
            }
        }
    }
}

fn answer(session: &mut AssessmentSession, input: &str) {
    let Some(index) = input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
    else {
        println!("  Enter an option number.");
        return;
    };
    if !session.select_option(index) {
        println!("  No option {input}.");
        return;
    }
    if session.advance() == AdvanceOutcome::Next {
        render_question(session);
    }
}

fn render_question(session: &AssessmentSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();
    println!();
    println!(
        "Q{}/{} [{} correct, {}s left]: {}",
        progress.index + 1,
        progress.total,
        progress.score,
        progress.time_remaining,
        question.prompt()
    );
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

fn report(session: &AssessmentSession) {
    let Some(result) = session.result() else {
        return;
    };
    println!();
    println!("Score: {}/{}", result.score, result.total);
    for (record, question) in session.answers().iter().zip(session.questions()) {
        let mark = if record.correct { "ok" } else { "wrong" };
        println!("  [{mark}] {}", question.prompt());
    }
    let unanswered = session.questions().len() - session.answers().len();
    if unanswered > 0 {
        println!("  {unanswered} question(s) not answered");
    }
}
