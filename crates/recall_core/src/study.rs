//! crates/recall_core/src/study.rs
//!
//! Ties the engines to the `ItemRepository` port: pull candidates for a deck,
//! apply a graded outcome, persist the result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::domain::{InvalidQuality, LearnableItem, Quality, ReviewLogEntry};
use crate::ports::{ItemRepository, PortError};
use crate::settings::SchedulerSettings;
use crate::{practice, review};

#[derive(Debug, thiserror::Error)]
pub enum StudyError {
    #[error(transparent)]
    InvalidQuality(#[from] InvalidQuality),
    #[error("Repository error: {0}")]
    Port(#[from] PortError),
}

pub type StudyResult<T> = Result<T, StudyError>;

/// The persisted result of one real review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub item: LearnableItem,
    pub log: ReviewLogEntry,
}

#[derive(Clone)]
pub struct StudyService {
    repository: Arc<dyn ItemRepository>,
    settings: SchedulerSettings,
}

impl StudyService {
    pub fn new(repository: Arc<dyn ItemRepository>, settings: SchedulerSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    /// Due items for a review session, capped at `limit` or the configured default.
    pub async fn due_items(
        &self,
        deck_id: Uuid,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> StudyResult<Vec<LearnableItem>> {
        let items = self.repository.fetch_items_for_deck(deck_id).await?;
        let limit = limit.unwrap_or(self.settings.due_limit);
        Ok(review::pull_due(items, now, limit))
    }

    /// Applies a real review and persists the item together with its log entry.
    ///
    /// Both are written in one repository call, so a failure leaves the stored
    /// item untouched and the review can be retried.
    pub async fn review(
        &self,
        item_id: Uuid,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> StudyResult<ReviewOutcome> {
        let item = self.repository.get_item(item_id).await?;
        let (item, log) = review::process_outcome(item, quality, now);

        self.repository.record_review(&item, &log).await?;

        info!(
            %item_id,
            quality = quality.value(),
            interval_days = item.interval_days,
            next_due_at = %item.next_due_at,
            "Review recorded"
        );
        Ok(ReviewOutcome { item, log })
    }

    /// Practice candidates for a deck, each tier capped at `tier_limit` or the configured default.
    pub async fn practice_items(
        &self,
        deck_id: Uuid,
        now: DateTime<Utc>,
        tier_limit: Option<usize>,
    ) -> StudyResult<Vec<LearnableItem>> {
        let items = self.repository.fetch_items_for_deck(deck_id).await?;
        let tier_limit = tier_limit.unwrap_or(self.settings.practice_tier_limit);
        Ok(practice::pull_practice(items, now, tier_limit))
    }

    /// Records a practice attempt, saving only when the fail count moved.
    pub async fn practice(&self, item_id: Uuid, quality: Quality) -> StudyResult<LearnableItem> {
        let before = self.repository.get_item(item_id).await?;
        let previous_fail_count = before.practice_fail_count;
        let item = practice::process_practice_outcome(before, quality);

        if item.practice_fail_count != previous_fail_count {
            self.repository.save(&item).await?;
            info!(
                %item_id,
                practice_fail_count = item.practice_fail_count,
                "Practice failure recorded"
            );
        }
        Ok(item)
    }

    pub async fn review_history(&self, item_id: Uuid) -> StudyResult<Vec<ReviewLogEntry>> {
        Ok(self.repository.logs_for_item(item_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryItemRepository;
    use chrono::Duration;
    use std::collections::HashSet;

    fn service(repository: Arc<dyn ItemRepository>) -> StudyService {
        StudyService::new(repository, SchedulerSettings::default())
    }

    async fn seeded(
        count: usize,
        now: DateTime<Utc>,
    ) -> (Arc<InMemoryItemRepository>, Uuid, Vec<LearnableItem>) {
        let repository = Arc::new(InMemoryItemRepository::new());
        let deck_id = Uuid::new_v4();
        let mut items = Vec::new();
        for i in 0..count {
            let item = LearnableItem::new(
                deck_id,
                format!("term-{i}"),
                format!("meaning-{i}"),
                None,
                now,
            );
            repository.insert_item(item.clone()).await.unwrap();
            items.push(item);
        }
        (repository, deck_id, items)
    }

    #[tokio::test]
    async fn review_persists_item_and_log() {
        let now = Utc::now();
        let (repository, _, items) = seeded(1, now).await;
        let study = service(repository.clone());

        let outcome = study.review(items[0].id, Quality::Good, now).await.unwrap();

        let stored = repository.get_item(items[0].id).await.unwrap();
        assert_eq!(stored, outcome.item);
        assert!(!stored.is_learning);
        assert_eq!(stored.next_due_at, now + Duration::days(1));

        let logs = study.review_history(items[0].id).await.unwrap();
        assert_eq!(logs, vec![outcome.log]);
    }

    #[tokio::test]
    async fn reviewed_items_leave_the_due_queue() {
        let now = Utc::now();
        let (repository, deck_id, items) = seeded(3, now).await;
        let study = service(repository);

        study.review(items[0].id, Quality::Easy, now).await.unwrap();

        let due: HashSet<Uuid> = study
            .due_items(deck_id, now, None)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(due, HashSet::from([items[1].id, items[2].id]));
    }

    #[tokio::test]
    async fn practice_failure_is_saved_and_success_is_not() {
        let now = Utc::now();
        let (repository, _, items) = seeded(1, now).await;
        let study = service(repository.clone());

        study.practice(items[0].id, Quality::Again).await.unwrap();
        study.practice(items[0].id, Quality::Good).await.unwrap();

        let stored = repository.get_item(items[0].id).await.unwrap();
        assert_eq!(stored.practice_fail_count, 1);
        assert_eq!(stored.next_due_at, items[0].next_due_at);
        assert_eq!(repository.save_count().await, 1);
        assert!(study.review_history(items[0].id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn practice_failures_soften_the_next_real_review() {
        let now = Utc::now();
        let (repository, _, items) = seeded(1, now).await;
        let study = service(repository.clone());
        let id = items[0].id;

        study.review(id, Quality::Good, now).await.unwrap();
        for _ in 0..3 {
            study.practice(id, Quality::Again).await.unwrap();
        }
        let outcome = study
            .review(id, Quality::Easy, now + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(outcome.item.ease_factor, 2.5);
        assert_eq!(outcome.item.practice_fail_count, 0);
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let study = service(Arc::new(InMemoryItemRepository::new()));

        let err = study
            .review(Uuid::new_v4(), Quality::Good, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::Port(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_log_write_leaves_the_item_unchanged() {
        let now = Utc::now();
        let (repository, _, items) = seeded(1, now).await;
        let study = service(repository.clone());
        repository.fail_log_writes(true).await;

        for _ in 0..2 {
            let err = study.review(items[0].id, Quality::Good, now).await.unwrap_err();
            assert!(matches!(err, StudyError::Port(PortError::Unexpected(_))));
        }

        assert_eq!(repository.get_item(items[0].id).await.unwrap(), items[0]);
        assert_eq!(repository.save_count().await, 0);
        assert!(study.review_history(items[0].id).await.unwrap().is_empty());

        repository.fail_log_writes(false).await;
        let outcome = study.review(items[0].id, Quality::Good, now).await.unwrap();
        assert_eq!(outcome.item.review_count, 1);
        assert_eq!(outcome.item.interval_days, 1);
        assert_eq!(study.review_history(items[0].id).await.unwrap().len(), 1);
    }
}
