//! crates/recall_core/src/domain.rs
//!
//! Defines the pure, core data structures for the scheduling engine.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The lowest ease factor any item may carry.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor assigned to freshly created items.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Accuracy below which an item is flagged as struggling.
pub const STRUGGLING_ACCURACY: f64 = 0.8;

/// Represents one fact to be memorized, together with its scheduling state.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnableItem {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub term: String,
    pub translation: String,
    pub example: Option<String>,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub is_learning: bool,
    pub next_due_at: DateTime<Utc>,
    pub review_count: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub is_struggling: bool,
    /// Failed shadow-practice attempts since the last successful real review.
    pub practice_fail_count: u32,
    pub created_at: DateTime<Utc>,
}

impl LearnableItem {
    /// Creates an item in its initial learning state, due immediately.
    pub fn new(
        deck_id: Uuid,
        term: impl Into<String>,
        translation: impl Into<String>,
        example: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            deck_id,
            term: term.into(),
            translation: translation.into(),
            example,
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            is_learning: true,
            next_due_at: now,
            review_count: 0,
            correct_count: 0,
            incorrect_count: 0,
            last_reviewed_at: None,
            is_struggling: false,
            practice_fail_count: 0,
            created_at: now,
        }
    }

    /// Share of real reviews answered correctly, `None` before the first review.
    pub fn accuracy(&self) -> Option<f64> {
        if self.review_count == 0 {
            return None;
        }
        Some(f64::from(self.correct_count) / f64::from(self.review_count))
    }

    pub fn phase(&self) -> ReviewPhase {
        if self.is_learning {
            ReviewPhase::Learning
        } else {
            ReviewPhase::Graduated
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due_at <= now
    }
}

/// The two scheduling states an item cycles between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPhase {
    Learning,
    Graduated,
}

/// Append-only audit record of one real review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLogEntry {
    pub id: Uuid,
    pub item_id: Uuid,
    pub reviewed_at: DateTime<Utc>,
    pub correct: bool,
}

impl ReviewLogEntry {
    pub fn new(item_id: Uuid, correct: bool, reviewed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            reviewed_at,
            correct,
        }
    }
}

/// Raised when a raw grade falls outside `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid recall quality {0}: expected a value between 0 and 3")]
pub struct InvalidQuality(pub u8);

/// The four-point recall grade supplied after self-assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    Again = 0,
    Hard = 1,
    Good = 2,
    Easy = 3,
}

impl Quality {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Anything above `Again` counts as a correct recall.
    pub fn is_correct(self) -> bool {
        self != Quality::Again
    }
}

impl TryFrom<u8> for Quality {
    type Error = InvalidQuality;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Quality::Again),
            1 => Ok(Quality::Hard),
            2 => Ok(Quality::Good),
            3 => Ok(Quality::Easy),
            other => Err(InvalidQuality(other)),
        }
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.value()
    }
}
