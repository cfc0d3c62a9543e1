//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-item write locks.

use recall_core::study::StudyService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub study: StudyService,
    pub item_locks: ItemLocks,
}

impl AppState {
    pub fn new(study: StudyService) -> Self {
        Self {
            study,
            item_locks: ItemLocks::default(),
        }
    }
}

//=========================================================================================
// ItemLocks (Per-Item Write Serialization)
//=========================================================================================

/// Serializes fetch-mutate-persist sequences per item id.
///
/// Two outcomes for the same item are applied one after the other, so neither is
/// computed from a stale copy. Different items never wait on each other.
#[derive(Clone, Default)]
pub struct ItemLocks {
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl ItemLocks {
    /// Waits until no other request holds `item_id`, then holds it until the guard drops.
    pub async fn acquire(&self, item_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries nobody holds or waits on are only referenced by the map.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(item_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of items currently tracked.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_item_waits_for_the_current_holder() {
        let locks = ItemLocks::default();
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        let contender = tokio::spawn({
            let locks = locks.clone();
            async move {
                let _guard = locks.acquire(id).await;
            }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_items_do_not_block_each_other() {
        let locks = ItemLocks::default();
        let _first = locks.acquire(Uuid::new_v4()).await;
        let _second = locks.acquire(Uuid::new_v4()).await;

        assert_eq!(locks.tracked().await, 2);
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = ItemLocks::default();
        drop(locks.acquire(Uuid::new_v4()).await);

        let _held = locks.acquire(Uuid::new_v4()).await;
        assert_eq!(locks.tracked().await, 1);
    }
}
