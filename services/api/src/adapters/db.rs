//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ItemRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recall_core::domain::{LearnableItem, ReviewLogEntry};
use recall_core::ports::{ItemRepository, PortError, PortResult};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ItemRepository` port.
#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    /// Creates a new `PgItemRepository`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

const ITEM_COLUMNS: &str = "id, deck_id, term, translation, example, ease_factor, interval_days, \
     is_learning, next_due_at, review_count, correct_count, incorrect_count, last_reviewed_at, \
     is_struggling, practice_fail_count, created_at";

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ItemRecord {
    id: Uuid,
    deck_id: Uuid,
    term: String,
    translation: String,
    example: Option<String>,
    ease_factor: f64,
    interval_days: i32,
    is_learning: bool,
    next_due_at: DateTime<Utc>,
    review_count: i32,
    correct_count: i32,
    incorrect_count: i32,
    last_reviewed_at: Option<DateTime<Utc>>,
    is_struggling: bool,
    practice_fail_count: i32,
    created_at: DateTime<Utc>,
}

impl ItemRecord {
    fn to_domain(self) -> PortResult<LearnableItem> {
        Ok(LearnableItem {
            id: self.id,
            deck_id: self.deck_id,
            term: self.term,
            translation: self.translation,
            example: self.example,
            ease_factor: self.ease_factor,
            interval_days: from_column("interval_days", self.interval_days)?,
            is_learning: self.is_learning,
            next_due_at: self.next_due_at,
            review_count: from_column("review_count", self.review_count)?,
            correct_count: from_column("correct_count", self.correct_count)?,
            incorrect_count: from_column("incorrect_count", self.incorrect_count)?,
            last_reviewed_at: self.last_reviewed_at,
            is_struggling: self.is_struggling,
            practice_fail_count: from_column("practice_fail_count", self.practice_fail_count)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ReviewLogRecord {
    id: Uuid,
    item_id: Uuid,
    reviewed_at: DateTime<Utc>,
    correct: bool,
}

impl ReviewLogRecord {
    fn to_domain(self) -> ReviewLogEntry {
        ReviewLogEntry {
            id: self.id,
            item_id: self.item_id,
            reviewed_at: self.reviewed_at,
            correct: self.correct,
        }
    }
}

fn from_column(column: &str, value: i32) -> PortResult<u32> {
    u32::try_from(value).map_err(|_| {
        PortError::Unexpected(format!("Negative value {} in column {}", value, column))
    })
}

fn to_column(column: &str, value: u32) -> PortResult<i32> {
    i32::try_from(value)
        .map_err(|_| PortError::Unexpected(format!("Value {} overflows column {}", value, column)))
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `ItemRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn fetch_items_for_deck(&self, deck_id: Uuid) -> PortResult<Vec<LearnableItem>> {
        let query = format!(
            "SELECT {} FROM learnable_items WHERE deck_id = $1 ORDER BY created_at ASC",
            ITEM_COLUMNS
        );
        let records = sqlx::query_as::<_, ItemRecord>(&query)
            .bind(deck_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(ItemRecord::to_domain).collect()
    }

    async fn get_item(&self, item_id: Uuid) -> PortResult<LearnableItem> {
        let query = format!("SELECT {} FROM learnable_items WHERE id = $1", ITEM_COLUMNS);
        let record = sqlx::query_as::<_, ItemRecord>(&query)
            .bind(item_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Item {} not found", item_id))
                }
                _ => unexpected(e),
            })?;

        record.to_domain()
    }

    async fn logs_for_item(&self, item_id: Uuid) -> PortResult<Vec<ReviewLogEntry>> {
        let records = sqlx::query_as::<_, ReviewLogRecord>(
            "SELECT id, item_id, reviewed_at, correct FROM review_logs \
             WHERE item_id = $1 ORDER BY reviewed_at ASC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(ReviewLogRecord::to_domain).collect())
    }

    async fn insert_item(&self, item: LearnableItem) -> PortResult<()> {
        let query = format!(
            "INSERT INTO learnable_items ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
            ITEM_COLUMNS
        );
        sqlx::query(&query)
            .bind(item.id)
            .bind(item.deck_id)
            .bind(&item.term)
            .bind(&item.translation)
            .bind(&item.example)
            .bind(item.ease_factor)
            .bind(to_column("interval_days", item.interval_days)?)
            .bind(item.is_learning)
            .bind(item.next_due_at)
            .bind(to_column("review_count", item.review_count)?)
            .bind(to_column("correct_count", item.correct_count)?)
            .bind(to_column("incorrect_count", item.incorrect_count)?)
            .bind(item.last_reviewed_at)
            .bind(item.is_struggling)
            .bind(to_column("practice_fail_count", item.practice_fail_count)?)
            .bind(item.created_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn save(&self, item: &LearnableItem) -> PortResult<()> {
        update_schedule(&self.pool, item).await
    }

    async fn append_log(&self, entry: &ReviewLogEntry) -> PortResult<()> {
        insert_log(&self.pool, entry).await
    }

    async fn record_review(&self, item: &LearnableItem, entry: &ReviewLogEntry) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        update_schedule(&mut *tx, item).await?;
        insert_log(&mut *tx, entry).await?;
        // Dropping `tx` on an early return rolls both statements back.
        tx.commit().await.map_err(unexpected)
    }
}

//=========================================================================================
// Statements Shared by Pool and Transaction Writes
//=========================================================================================

async fn update_schedule<'e, E>(executor: E, item: &LearnableItem) -> PortResult<()>
where
    E: PgExecutor<'e>,
{
    // Content columns belong to the authoring side and are not rewritten here.
    let result = sqlx::query(
        "UPDATE learnable_items SET ease_factor = $2, interval_days = $3, is_learning = $4, \
         next_due_at = $5, review_count = $6, correct_count = $7, incorrect_count = $8, \
         last_reviewed_at = $9, is_struggling = $10, practice_fail_count = $11 WHERE id = $1",
    )
    .bind(item.id)
    .bind(item.ease_factor)
    .bind(to_column("interval_days", item.interval_days)?)
    .bind(item.is_learning)
    .bind(item.next_due_at)
    .bind(to_column("review_count", item.review_count)?)
    .bind(to_column("correct_count", item.correct_count)?)
    .bind(to_column("incorrect_count", item.incorrect_count)?)
    .bind(item.last_reviewed_at)
    .bind(item.is_struggling)
    .bind(to_column("practice_fail_count", item.practice_fail_count)?)
    .execute(executor)
    .await
    .map_err(unexpected)?;

    if result.rows_affected() == 0 {
        return Err(PortError::NotFound(format!("Item {} not found", item.id)));
    }
    Ok(())
}

async fn insert_log<'e, E>(executor: E, entry: &ReviewLogEntry) -> PortResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO review_logs (id, item_id, reviewed_at, correct) VALUES ($1, $2, $3, $4)",
    )
    .bind(entry.id)
    .bind(entry.item_id)
    .bind(entry.reviewed_at)
    .bind(entry.correct)
    .execute(executor)
    .await
    .map_err(unexpected)?;
    Ok(())
}
