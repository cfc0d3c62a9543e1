//! crates/recall_core/src/memory.rs
//!
//! An in-process implementation of the `ItemRepository` port, for tests and for
//! hosts that keep a deck in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{LearnableItem, ReviewLogEntry};
use crate::ports::{ItemRepository, PortError, PortResult};

#[derive(Default)]
struct Store {
    items: HashMap<Uuid, LearnableItem>,
    logs: Vec<ReviewLogEntry>,
    saves: usize,
    fail_log_writes: bool,
}

#[derive(Default)]
pub struct InMemoryItemRepository {
    store: RwLock<Store>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful item writes (`save` or `record_review`) so far.
    pub async fn save_count(&self) -> usize {
        self.store.read().await.saves
    }

    /// While set, every log write fails as if the backing store were unavailable.
    pub async fn fail_log_writes(&self, fail: bool) {
        self.store.write().await.fail_log_writes = fail;
    }
}

impl Store {
    /// Checks that `entry` can be appended, without writing anything.
    fn check_log(&self, entry: &ReviewLogEntry) -> PortResult<()> {
        if self.fail_log_writes {
            return Err(PortError::Unexpected("Review log is not writable".to_string()));
        }
        if !self.items.contains_key(&entry.item_id) {
            return Err(PortError::NotFound(format!("Item {} not found", entry.item_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn fetch_items_for_deck(&self, deck_id: Uuid) -> PortResult<Vec<LearnableItem>> {
        let store = self.store.read().await;
        let mut items: Vec<LearnableItem> = store
            .items
            .values()
            .filter(|item| item.deck_id == deck_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get_item(&self, item_id: Uuid) -> PortResult<LearnableItem> {
        self.store
            .read()
            .await
            .items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Item {} not found", item_id)))
    }

    async fn logs_for_item(&self, item_id: Uuid) -> PortResult<Vec<ReviewLogEntry>> {
        let store = self.store.read().await;
        let mut logs: Vec<ReviewLogEntry> = store
            .logs
            .iter()
            .filter(|entry| entry.item_id == item_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| a.reviewed_at.cmp(&b.reviewed_at));
        Ok(logs)
    }

    async fn insert_item(&self, item: LearnableItem) -> PortResult<()> {
        let mut store = self.store.write().await;
        if store.items.contains_key(&item.id) {
            return Err(PortError::Unexpected(format!("Item {} already exists", item.id)));
        }
        store.items.insert(item.id, item);
        Ok(())
    }

    async fn save(&self, item: &LearnableItem) -> PortResult<()> {
        let mut store = self.store.write().await;
        let slot = store
            .items
            .get_mut(&item.id)
            .ok_or_else(|| PortError::NotFound(format!("Item {} not found", item.id)))?;
        *slot = item.clone();
        store.saves += 1;
        Ok(())
    }

    async fn append_log(&self, entry: &ReviewLogEntry) -> PortResult<()> {
        let mut store = self.store.write().await;
        store.check_log(entry)?;
        store.logs.push(entry.clone());
        Ok(())
    }

    async fn record_review(&self, item: &LearnableItem, entry: &ReviewLogEntry) -> PortResult<()> {
        let mut store = self.store.write().await;
        if !store.items.contains_key(&item.id) {
            return Err(PortError::NotFound(format!("Item {} not found", item.id)));
        }
        store.check_log(entry)?;

        store.items.insert(item.id, item.clone());
        store.saves += 1;
        store.logs.push(entry.clone());
        Ok(())
    }
}
