//! Router-level tests for the study endpoints, backed by the in-memory repository.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use recall_api::web::{
    self,
    rest::{ItemView, ReviewLogView, ReviewResponse},
    AppState,
};
use recall_core::{
    InMemoryItemRepository, ItemRepository, LearnableItem, SchedulerSettings, StudyService,
};
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use uuid::Uuid;

struct Fixture {
    app: Router,
    repository: Arc<InMemoryItemRepository>,
    deck_id: Uuid,
    items: Vec<LearnableItem>,
}

async fn fixture(count: usize) -> Fixture {
    let repository = Arc::new(InMemoryItemRepository::new());
    let deck_id = Uuid::new_v4();
    let created = Utc::now() - Duration::days(1);
    let mut items = Vec::new();
    for i in 0..count {
        let item = LearnableItem::new(
            deck_id,
            format!("word-{i}"),
            format!("translation-{i}"),
            None,
            created + Duration::seconds(i as i64),
        );
        repository.insert_item(item.clone()).await.unwrap();
        items.push(item);
    }

    let study = StudyService::new(repository.clone(), SchedulerSettings::default());
    let app = web::router(Arc::new(AppState::new(study)));
    Fixture {
        app,
        repository,
        deck_id,
        items,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: String) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_grade(uri: String, quality: u8) -> Request<Body> {
    Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(format!("{{\"quality\":{}}}", quality)))
        .unwrap()
}

fn json<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn health_check_responds() {
    let fx = fixture(0).await;
    let (status, _) = send(&fx.app, get("/health".to_string())).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn due_endpoint_respects_the_limit() {
    let fx = fixture(5).await;

    let (status, body) = send(&fx.app, get(format!("/decks/{}/due?limit=3", fx.deck_id))).await;

    assert_eq!(status, StatusCode::OK);
    let items: Vec<ItemView> = json(&body);
    assert_eq!(items.len(), 3);
    // Created one second apart and due at creation, so the three oldest qualify.
    let mut ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
    ids.sort();
    let mut expected: Vec<Uuid> = fx.items[..3].iter().map(|item| item.id).collect();
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn review_reschedules_and_logs() {
    let fx = fixture(1).await;
    let id = fx.items[0].id;

    let (status, body) = send(&fx.app, post_grade(format!("/items/{}/review", id), 3)).await;

    assert_eq!(status, StatusCode::OK);
    let response: ReviewResponse = json(&body);
    assert!(!response.item.is_learning);
    assert_eq!(response.item.interval_days, 4);
    assert!(response.log.correct);

    let (status, body) = send(&fx.app, get(format!("/items/{}/logs", id))).await;
    assert_eq!(status, StatusCode::OK);
    let logs: Vec<ReviewLogView> = json(&body);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].id, response.log.id);

    let (_, body) = send(&fx.app, get(format!("/decks/{}/due", fx.deck_id))).await;
    let due: Vec<ItemView> = json(&body);
    assert!(due.is_empty());
}

#[tokio::test]
async fn out_of_range_quality_is_rejected_before_any_write() {
    let fx = fixture(1).await;
    let id = fx.items[0].id;

    let (status, _) = send(&fx.app, post_grade(format!("/items/{}/review", id), 4)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&fx.app, post_grade(format!("/items/{}/practice", id), 9)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(fx.repository.save_count().await, 0);
    assert_eq!(fx.repository.get_item(id).await.unwrap(), fx.items[0]);
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let fx = fixture(0).await;

    let (status, _) = send(
        &fx.app,
        post_grade(format!("/items/{}/review", Uuid::new_v4()), 2),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn practice_failure_keeps_the_schedule() {
    let fx = fixture(1).await;
    let id = fx.items[0].id;

    let (status, body) = send(&fx.app, post_grade(format!("/items/{}/practice", id), 0)).await;

    assert_eq!(status, StatusCode::OK);
    let item: ItemView = json(&body);
    assert_eq!(item.practice_fail_count, 1);
    assert_eq!(item.next_due_at, fx.items[0].next_due_at);
    assert_eq!(item.review_count, 0);
    assert!(item.is_learning);
}

#[tokio::test]
async fn practice_falls_back_to_newest_items() {
    let fx = fixture(25).await;

    let (status, body) = send(
        &fx.app,
        get(format!("/decks/{}/practice", fx.deck_id)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let items: Vec<ItemView> = json(&body);
    assert_eq!(items.len(), 20);
    let oldest = fx.items[..5].iter().map(|item| item.id).collect::<Vec<_>>();
    assert!(items.iter().all(|item| !oldest.contains(&item.id)));
}
