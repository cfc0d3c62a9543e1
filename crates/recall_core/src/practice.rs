//! crates/recall_core/src/practice.rs
//!
//! Shadow rehearsal. Practice picks items through a tiered fallback and only ever
//! records failures in `practice_fail_count`; the durable schedule is left alone.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::domain::{LearnableItem, Quality};
use crate::review::due_order;

/// How far back a real review still counts as "recent" for practice.
const RECENT_REVIEW_WINDOW_DAYS: i64 = 3;

/// Which fallback tier produced a practice set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeTier {
    /// Struggling items plus recently reviewed items.
    Focused,
    /// Newest items of the deck, used when nothing is struggling or recent.
    Newest,
}

/// Selects practice candidates and returns them shuffled.
pub fn pull_practice(
    items: Vec<LearnableItem>,
    now: DateTime<Utc>,
    tier_limit: usize,
) -> Vec<LearnableItem> {
    pull_practice_with_rng(items, now, tier_limit, &mut rand::thread_rng())
}

/// Same as [`pull_practice`], drawing the presentation order from `rng`.
pub fn pull_practice_with_rng<R: Rng + ?Sized>(
    items: Vec<LearnableItem>,
    now: DateTime<Utc>,
    tier_limit: usize,
    rng: &mut R,
) -> Vec<LearnableItem> {
    let (mut selected, tier) = select_practice(items, now, tier_limit);
    selected.shuffle(rng);

    debug!(?tier, selected = selected.len(), tier_limit, "Pulled practice items");
    selected
}

/// Resolves the practice tiers without shuffling.
///
/// The union of the struggling and recent tiers is not capped again, so up to
/// `2 * tier_limit` items can come back from the focused tier.
pub fn select_practice(
    items: Vec<LearnableItem>,
    now: DateTime<Utc>,
    tier_limit: usize,
) -> (Vec<LearnableItem>, PracticeTier) {
    let recent_cutoff = now - Duration::days(RECENT_REVIEW_WINDOW_DAYS);

    let mut struggling: Vec<&LearnableItem> =
        items.iter().filter(|item| item.is_struggling).collect();
    struggling.sort_by(|a, b| due_order(a, b));
    struggling.truncate(tier_limit);

    let mut recent: Vec<&LearnableItem> = items
        .iter()
        .filter(|item| item.last_reviewed_at.is_some_and(|at| at >= recent_cutoff))
        .collect();
    recent.sort_by(|a, b| {
        b.last_reviewed_at
            .cmp(&a.last_reviewed_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    recent.truncate(tier_limit);

    let mut seen = HashSet::new();
    let focused: Vec<LearnableItem> = struggling
        .into_iter()
        .chain(recent)
        .filter(|item| seen.insert(item.id))
        .cloned()
        .collect();

    if !focused.is_empty() {
        return (focused, PracticeTier::Focused);
    }

    let mut newest = items;
    newest.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    newest.truncate(tier_limit);
    (newest, PracticeTier::Newest)
}

/// Records a practice attempt. Only a failed attempt changes anything.
pub fn process_practice_outcome(mut item: LearnableItem, quality: Quality) -> LearnableItem {
    if quality == Quality::Again {
        item.practice_fail_count = item.practice_fail_count.saturating_add(1);
        debug!(
            item_id = %item.id,
            practice_fail_count = item.practice_fail_count,
            "Recorded failed practice attempt"
        );
    }
    item
}
