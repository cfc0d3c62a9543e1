//! crates/recall_core/src/review.rs
//!
//! The durable scheduler: a variant of SM-2 with a short-interval learning phase
//! and an ease-driven graduated phase. Every function here is pure; persisting
//! the results is the caller's job.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::domain::{
    LearnableItem, Quality, ReviewLogEntry, MIN_EASE_FACTOR, STRUGGLING_ACCURACY,
};

/// Requeue delay after a failed recall.
const AGAIN_REQUEUE_MINUTES: i64 = 1;
/// Requeue delay after a hard recall while still learning.
const HARD_LEARNING_REQUEUE_MINUTES: i64 = 10;

const AGAIN_EASE_DROP: f64 = 0.2;
const HARD_EASE_DROP: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;
const HARD_INTERVAL_GROWTH: f64 = 1.2;
const EASY_INTERVAL_BONUS: f64 = 1.3;

const GOOD_GRADUATION_DAYS: u32 = 1;
const EASY_GRADUATION_DAYS: u32 = 4;

const PRACTICE_PENALTY_STEP: f64 = 0.05;
const PRACTICE_PENALTY_CAP: f64 = 0.15;

/// Ease reduction earned by failed shadow-practice attempts, capped at 0.15.
pub fn ease_penalty(practice_fail_count: u32) -> f64 {
    (f64::from(practice_fail_count) * PRACTICE_PENALTY_STEP).min(PRACTICE_PENALTY_CAP)
}

/// Ascending due date, then creation time, then id.
pub(crate) fn due_order(a: &LearnableItem, b: &LearnableItem) -> Ordering {
    a.next_due_at
        .cmp(&b.next_due_at)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Selects up to `limit` due items, earliest due first, and returns them shuffled.
pub fn pull_due(
    items: Vec<LearnableItem>,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<LearnableItem> {
    pull_due_with_rng(items, now, limit, &mut rand::thread_rng())
}

/// Same as [`pull_due`], drawing the presentation order from `rng`.
pub fn pull_due_with_rng<R: Rng + ?Sized>(
    items: Vec<LearnableItem>,
    now: DateTime<Utc>,
    limit: usize,
    rng: &mut R,
) -> Vec<LearnableItem> {
    let mut due: Vec<LearnableItem> = items.into_iter().filter(|item| item.is_due(now)).collect();
    let eligible = due.len();

    // Which items survive the cap depends on this sort; the shuffle below does not.
    due.sort_by(due_order);
    due.truncate(limit);
    due.shuffle(rng);

    debug!(eligible, selected = due.len(), limit, "Pulled due items");
    due
}

/// Applies one graded real review to `item`.
///
/// Returns the updated item and the audit entry that must be appended alongside it.
pub fn process_outcome(
    mut item: LearnableItem,
    quality: Quality,
    now: DateTime<Utc>,
) -> (LearnableItem, ReviewLogEntry) {
    let correct = quality.is_correct();

    item.review_count = item.review_count.saturating_add(1);
    if correct {
        item.correct_count = item.correct_count.saturating_add(1);
    } else {
        item.incorrect_count = item.incorrect_count.saturating_add(1);
    }
    item.last_reviewed_at = Some(now);
    item.is_struggling =
        f64::from(item.correct_count) / f64::from(item.review_count) < STRUGGLING_ACCURACY;

    if quality == Quality::Again {
        item.is_struggling = true;
        item.ease_factor = (item.ease_factor - AGAIN_EASE_DROP).max(MIN_EASE_FACTOR);
        item.interval_days = 0;
        item.is_learning = true;
        item.next_due_at = shift(now, Duration::minutes(AGAIN_REQUEUE_MINUTES));
    } else {
        if item.is_learning {
            apply_learning_step(&mut item, quality, now);
        } else {
            apply_graduated_step(&mut item, quality);
        }

        item.practice_fail_count = 0;
        if !item.is_learning {
            item.next_due_at = shift(now, Duration::days(i64::from(item.interval_days)));
        }
    }

    debug!(
        item_id = %item.id,
        quality = quality.value(),
        phase = ?item.phase(),
        ease_factor = item.ease_factor,
        interval_days = item.interval_days,
        next_due_at = %item.next_due_at,
        "Processed review outcome"
    );

    let log = ReviewLogEntry::new(item.id, correct, now);
    (item, log)
}

fn apply_learning_step(item: &mut LearnableItem, quality: Quality, now: DateTime<Utc>) {
    match quality {
        Quality::Good | Quality::Easy => {
            item.is_learning = false;
            item.interval_days = if quality == Quality::Easy {
                EASY_GRADUATION_DAYS
            } else {
                GOOD_GRADUATION_DAYS
            };
        }
        _ => {
            item.next_due_at = shift(now, Duration::minutes(HARD_LEARNING_REQUEUE_MINUTES));
        }
    }
}

fn apply_graduated_step(item: &mut LearnableItem, quality: Quality) {
    let penalty = ease_penalty(item.practice_fail_count);
    let interval = f64::from(item.interval_days);

    match quality {
        Quality::Hard => {
            item.ease_factor = (item.ease_factor - HARD_EASE_DROP - penalty).max(MIN_EASE_FACTOR);
            item.interval_days = grown_interval(interval * HARD_INTERVAL_GROWTH);
        }
        Quality::Good => {
            item.ease_factor = (item.ease_factor - penalty).max(MIN_EASE_FACTOR);
            item.interval_days = grown_interval(interval * item.ease_factor);
        }
        Quality::Easy => {
            // Only ever raises the ease, so no floor.
            item.ease_factor += EASY_EASE_BONUS - penalty;
            item.interval_days = grown_interval(interval * item.ease_factor * EASY_INTERVAL_BONUS);
        }
        Quality::Again => {}
    }
}

/// Floors a grown interval, never dropping below one day.
fn grown_interval(days: f64) -> u32 {
    (days.floor() as u32).max(1)
}

fn shift(now: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
