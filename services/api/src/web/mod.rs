pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use rest::{
    due_items_handler, health_handler, practice_handler, practice_items_handler,
    review_handler, review_logs_handler,
};
pub use state::{AppState, ItemLocks};

/// Builds the study API router. Middleware layers are added by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/decks/{deck_id}/due", get(due_items_handler))
        .route("/decks/{deck_id}/practice", get(practice_items_handler))
        .route("/items/{item_id}/review", post(review_handler))
        .route("/items/{item_id}/practice", post(practice_handler))
        .route("/items/{item_id}/logs", get(review_logs_handler))
        .with_state(app_state)
}
