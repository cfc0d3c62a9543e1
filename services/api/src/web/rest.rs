//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the study endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use recall_core::{
    domain::{LearnableItem, Quality, ReviewLogEntry},
    ports::PortError,
    study::StudyError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        due_items_handler,
        practice_items_handler,
        review_handler,
        practice_handler,
        review_logs_handler,
    ),
    components(
        schemas(ItemView, ReviewLogView, ReviewResponse, GradeRequest)
    ),
    tags(
        (name = "Recall API", description = "Spaced-repetition review and practice sessions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// A learnable item together with its scheduling state.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemView {
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
    pub practice_fail_count: u32,
    pub created_at: DateTime<Utc>,
}

impl From<LearnableItem> for ItemView {
    fn from(item: LearnableItem) -> Self {
        Self {
            id: item.id,
            deck_id: item.deck_id,
            term: item.term,
            translation: item.translation,
            example: item.example,
            ease_factor: item.ease_factor,
            interval_days: item.interval_days,
            is_learning: item.is_learning,
            next_due_at: item.next_due_at,
            review_count: item.review_count,
            correct_count: item.correct_count,
            incorrect_count: item.incorrect_count,
            last_reviewed_at: item.last_reviewed_at,
            is_struggling: item.is_struggling,
            practice_fail_count: item.practice_fail_count,
            created_at: item.created_at,
        }
    }
}

/// One entry of an item's review history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewLogView {
    pub id: Uuid,
    pub item_id: Uuid,
    pub reviewed_at: DateTime<Utc>,
    pub correct: bool,
}

impl From<ReviewLogEntry> for ReviewLogView {
    fn from(entry: ReviewLogEntry) -> Self {
        Self {
            id: entry.id,
            item_id: entry.item_id,
            reviewed_at: entry.reviewed_at,
            correct: entry.correct,
        }
    }
}

/// The response payload sent after a real review was recorded.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub item: ItemView,
    pub log: ReviewLogView,
}

/// A recall grade: 0 = Again, 1 = Hard, 2 = Good, 3 = Easy.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GradeRequest {
    pub quality: u8,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DueQuery {
    /// Maximum number of due items to return.
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PracticeQuery {
    /// Cap applied to each practice tier.
    pub tier_limit: Option<usize>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn map_study_error(e: StudyError) -> (StatusCode, String) {
    match e {
        StudyError::InvalidQuality(e) => {
            warn!("Rejected grade: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        StudyError::Port(PortError::NotFound(message)) => (StatusCode::NOT_FOUND, message),
        StudyError::Port(e) => {
            error!("Repository failure: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to access study data".to_string(),
            )
        }
    }
}

fn parse_quality(request: &GradeRequest) -> Result<Quality, (StatusCode, String)> {
    Quality::try_from(request.quality).map_err(|e| map_study_error(e.into()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Items of a deck that are due for a real review, in shuffled order.
#[utoipa::path(
    get,
    path = "/decks/{deck_id}/due",
    params(
        ("deck_id" = Uuid, Path, description = "The deck to study."),
        DueQuery
    ),
    responses(
        (status = 200, description = "Due items", body = [ItemView]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn due_items_handler(
    State(app_state): State<Arc<AppState>>,
    Path(deck_id): Path<Uuid>,
    Query(query): Query<DueQuery>,
) -> Result<Json<Vec<ItemView>>, (StatusCode, String)> {
    let items = app_state
        .study
        .due_items(deck_id, Utc::now(), query.limit)
        .await
        .map_err(map_study_error)?;

    Ok(Json(items.into_iter().map(ItemView::from).collect()))
}

/// Candidates for a practice session, in shuffled order.
#[utoipa::path(
    get,
    path = "/decks/{deck_id}/practice",
    params(
        ("deck_id" = Uuid, Path, description = "The deck to practice."),
        PracticeQuery
    ),
    responses(
        (status = 200, description = "Practice items", body = [ItemView]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn practice_items_handler(
    State(app_state): State<Arc<AppState>>,
    Path(deck_id): Path<Uuid>,
    Query(query): Query<PracticeQuery>,
) -> Result<Json<Vec<ItemView>>, (StatusCode, String)> {
    let items = app_state
        .study
        .practice_items(deck_id, Utc::now(), query.tier_limit)
        .await
        .map_err(map_study_error)?;

    Ok(Json(items.into_iter().map(ItemView::from).collect()))
}

/// Record a real review and reschedule the item.
#[utoipa::path(
    post,
    path = "/items/{item_id}/review",
    request_body = GradeRequest,
    params(("item_id" = Uuid, Path, description = "The reviewed item.")),
    responses(
        (status = 200, description = "Review recorded", body = ReviewResponse),
        (status = 400, description = "Quality outside 0..=3"),
        (status = 404, description = "Unknown item"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn review_handler(
    State(app_state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<GradeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let quality = parse_quality(&request)?;

    let _guard = app_state.item_locks.acquire(item_id).await;
    let outcome = app_state
        .study
        .review(item_id, quality, Utc::now())
        .await
        .map_err(map_study_error)?;

    let response = ReviewResponse {
        item: outcome.item.into(),
        log: outcome.log.into(),
    };
    Ok((StatusCode::OK, Json(response)))
}

/// Record a practice attempt. Never moves the real schedule.
#[utoipa::path(
    post,
    path = "/items/{item_id}/practice",
    request_body = GradeRequest,
    params(("item_id" = Uuid, Path, description = "The practiced item.")),
    responses(
        (status = 200, description = "Practice recorded", body = ItemView),
        (status = 400, description = "Quality outside 0..=3"),
        (status = 404, description = "Unknown item"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn practice_handler(
    State(app_state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<GradeRequest>,
) -> Result<Json<ItemView>, (StatusCode, String)> {
    let quality = parse_quality(&request)?;

    let _guard = app_state.item_locks.acquire(item_id).await;
    let item = app_state
        .study
        .practice(item_id, quality)
        .await
        .map_err(map_study_error)?;

    Ok(Json(item.into()))
}

/// Review history of an item, oldest first.
#[utoipa::path(
    get,
    path = "/items/{item_id}/logs",
    params(("item_id" = Uuid, Path, description = "The item.")),
    responses(
        (status = 200, description = "Review log entries", body = [ReviewLogView]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn review_logs_handler(
    State(app_state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Vec<ReviewLogView>>, (StatusCode, String)> {
    let logs = app_state
        .study
        .review_history(item_id)
        .await
        .map_err(map_study_error)?;

    Ok(Json(logs.into_iter().map(ReviewLogView::from).collect()))
}
