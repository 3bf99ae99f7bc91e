use vocab_review::config::AppConfig;
use vocab_review::models::{ManualClock, ReviewStats};
use vocab_review::*;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let store = SqliteStore::open(&config.db_path)?;
    let clock = ManualClock::new(Utc::now());
    let coordinator = SessionCoordinator::with_config(store, clock, config.queue.clone());
    let learner = OwnerId::from("demo-learner");

    for word in ["cześć", "dziękuję", "proszę"] {
        match coordinator.enroll(&learner, &ItemId::from(word)) {
            Ok(_) | Err(CoordinatorError::Store(StoreError::AlreadyExists { .. })) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let mut session = coordinator.start_session(&learner)?;
    println!("{}", session.progress_message());

    // Alternate answers so the demo shows every kind of transition.
    let answers = [Grade::Good, Grade::Fail, Grade::Easy, Grade::Hard];
    let mut turn = 0;
    let mut recalled = 0;
    while let Some(item) = session.current_item() {
        let word = item.item_id.clone();
        let grade = answers[turn % answers.len()];
        turn += 1;
        match session.grade_current(&coordinator, grade) {
            Ok(Some(updated)) => {
                if grade.is_pass() {
                    recalled += 1;
                }
                println!(
                    "  {word}: {grade} -> {} (next in {} days)",
                    updated.state.as_str(),
                    updated.interval_days
                );
            }
            Ok(None) => break,
            Err(e) if e.is_conflict() => {
                println!("  {word}: skipped ({e})");
                session.skip();
                if turn > session.total_count() * 2 {
                    break;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    println!("{}", session.progress_message());
    println!("Recalled {recalled} of {}", session.graded_count());

    coordinator.clock().advance_days(1);
    let stats: ReviewStats = coordinator.stats(&learner)?;
    println!(
        "Tomorrow: {} due ({} new), {} learning, {} in review, {} lapsed",
        stats.due_total(),
        stats.due_new,
        stats.learning,
        stats.review,
        stats.lapsed
    );
    for item in coordinator.due_queue(&learner)? {
        println!("  - {} ({})", item.item_id, item.state.as_str());
    }

    Ok(())
}
