//! crates/recall_core/src/ports.rs
//!
//! Defines the service contracts (traits) the scheduling core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the storage that actually holds items and review logs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{LearnableItem, ReviewLogEntry};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., a database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Fetches and persists learnable items and their review logs.
///
/// Implementations own write durability. A single item's mutate-then-persist
/// sequence must not be interleaved with another scheduling update for the same
/// item; callers running several sessions at once serialize writes per item id.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    // --- Reads ---
    async fn fetch_items_for_deck(&self, deck_id: Uuid) -> PortResult<Vec<LearnableItem>>;

    async fn get_item(&self, item_id: Uuid) -> PortResult<LearnableItem>;

    /// Review logs for one item, oldest first.
    async fn logs_for_item(&self, item_id: Uuid) -> PortResult<Vec<ReviewLogEntry>>;

    // --- Writes ---
    /// Used by the authoring side; the engines never create items.
    async fn insert_item(&self, item: LearnableItem) -> PortResult<()>;

    async fn save(&self, item: &LearnableItem) -> PortResult<()>;

    async fn append_log(&self, entry: &ReviewLogEntry) -> PortResult<()>;

    /// Saves `item` and appends `entry` as one atomic write: either both land or neither.
    async fn record_review(&self, item: &LearnableItem, entry: &ReviewLogEntry) -> PortResult<()>;
}
