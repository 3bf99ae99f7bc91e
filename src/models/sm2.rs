//! SM-2 family scheduler adapted to four recall grades.
//!
//! Each review item carries an ease factor that controls how quickly its
//! interval grows:
//! - `Fail` resets the streak, lapses the item and shortens the interval to 1 day
//! - `Hard` grows the interval slowly (x1.2) and lowers the ease factor by 0.15
//! - `Good` follows the classic 1 day → 6 days → interval × EF progression
//! - `Easy` raises the ease factor by 0.15 and adds a 1.3 bonus multiplier
//!
//! The ease factor never falls below 1.3 and intervals stay within
//! `[1, 36500]` days. Scheduling is a pure function of its inputs.

use super::review_item::MIN_EASE_FACTOR;
use super::{Grade, ItemId, ItemState, OwnerId, ReviewItem, ReviewOutcome};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Shortest interval after any review.
pub const MIN_INTERVAL_DAYS: u32 = 1;
/// Longest interval, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const FAIL_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;
const HARD_INTERVAL_MULTIPLIER: f64 = 1.2;
const EASY_INTERVAL_MULTIPLIER: f64 = 1.3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("invalid review grade: {0}")]
    InvalidGrade(String),
    #[error("outcome for {outcome_owner}/{outcome_item} is not for {item_owner}/{item_item}")]
    MismatchedOutcome {
        item_owner: OwnerId,
        item_item: ItemId,
        outcome_owner: OwnerId,
        outcome_item: ItemId,
    },
}

/// Applies one graded outcome to an item and returns its next scheduling state.
///
/// The input item is left untouched; identical inputs always produce identical output.
pub fn schedule_outcome(
    item: &ReviewItem,
    outcome: &ReviewOutcome,
) -> Result<ReviewItem, SchedulerError> {
    if item.owner_id != outcome.owner_id || item.item_id != outcome.item_id {
        return Err(SchedulerError::MismatchedOutcome {
            item_owner: item.owner_id.clone(),
            item_item: item.item_id.clone(),
            outcome_owner: outcome.owner_id.clone(),
            outcome_item: outcome.item_id.clone(),
        });
    }

    let ease = item.ease_factor.max(MIN_EASE_FACTOR);
    let interval = item.interval_days as f64;
    let mut next = item.clone();

    match outcome.grade {
        Grade::Fail => {
            next.lapses = item.lapses.saturating_add(1);
            next.repetitions = 0;
            next.ease_factor = (ease - FAIL_EASE_PENALTY).max(MIN_EASE_FACTOR);
            next.interval_days = MIN_INTERVAL_DAYS;
        }
        Grade::Hard => {
            next.repetitions = item.repetitions.saturating_add(1);
            next.ease_factor = (ease - HARD_EASE_PENALTY).max(MIN_EASE_FACTOR);
            next.interval_days = clamp_interval(interval * HARD_INTERVAL_MULTIPLIER);
        }
        Grade::Good => {
            next.repetitions = item.repetitions.saturating_add(1);
            next.ease_factor = ease;
            next.interval_days = match next.repetitions {
                0 | 1 => 1,
                2 => 6,
                _ => clamp_interval(interval * ease),
            };
        }
        Grade::Easy => {
            next.repetitions = item.repetitions.saturating_add(1);
            next.ease_factor = ease + EASY_EASE_BONUS;
            let base = if next.repetitions <= 1 { 1.0 } else { interval };
            next.interval_days =
                clamp_interval(base * next.ease_factor * EASY_INTERVAL_MULTIPLIER);
        }
    }

    next.state = next_state(item.state, outcome.grade, next.repetitions);
    next.last_reviewed_at = Some(outcome.answered_at);
    next.due_at = due_after(outcome.answered_at, next.interval_days);

    tracing::debug!(
        owner = %item.owner_id,
        item = %item.item_id,
        grade = %outcome.grade,
        from = item.state.as_str(),
        to = next.state.as_str(),
        interval_days = next.interval_days,
        ease_factor = next.ease_factor,
        "scheduled review outcome"
    );

    Ok(next)
}

/// State transition for a grade, given the repetition count after the review.
pub fn next_state(from: ItemState, grade: Grade, repetitions: u32) -> ItemState {
    match (from, grade) {
        (_, Grade::Fail) => ItemState::Lapsed,
        (ItemState::Lapsed, _) => ItemState::Learning,
        (_, Grade::Easy) => ItemState::Review,
        (_, Grade::Hard | Grade::Good) if repetitions >= 2 => ItemState::Review,
        (_, Grade::Hard | Grade::Good) => ItemState::Learning,
    }
}

fn clamp_interval(days: f64) -> u32 {
    if days.is_nan() {
        return MIN_INTERVAL_DAYS;
    }
    days.round()
        .clamp(MIN_INTERVAL_DAYS as f64, MAX_INTERVAL_DAYS as f64) as u32
}

fn due_after(answered_at: DateTime<Utc>, interval_days: u32) -> DateTime<Utc> {
    answered_at
        .checked_add_signed(Duration::days(i64::from(interval_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
