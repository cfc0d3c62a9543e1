//! crates/recall_core/src/settings.rs
//!
//! Tunable caps for candidate selection.

/// Default cap on how many due items a single review session pulls.
pub const DEFAULT_DUE_LIMIT: usize = 100;

/// Default cap applied to each practice tier independently.
pub const DEFAULT_PRACTICE_TIER_LIMIT: usize = 20;

/// Selection caps used by the study service when the caller gives none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub due_limit: usize,
    pub practice_tier_limit: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            due_limit: DEFAULT_DUE_LIMIT,
            practice_tier_limit: DEFAULT_PRACTICE_TIER_LIMIT,
        }
    }
}
