//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `ArchiveStore` port from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use idea_polisher_core::domain::ArchivedItem;
use idea_polisher_core::ports::{ArchiveStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ArchiveStore` port.
#[derive(Clone)]
pub struct PgArchiveStore {
    pool: PgPool,
}

impl PgArchiveStore {
    /// Creates a new `PgArchiveStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ArchivedItemRecord {
    user_id: Uuid,
    title: String,
    original_notes: String,
    polished_outline: String,
    expansion_ideas: String,
    recipient_email: Option<String>,
    category: String,
    archive_id: String,
    created_at: DateTime<Utc>,
}

impl ArchivedItemRecord {
    fn to_domain(self) -> ArchivedItem {
        ArchivedItem {
            user_id: self.user_id,
            title: self.title,
            original_notes: self.original_notes,
            polished_outline: self.polished_outline,
            expansion_ideas: self.expansion_ideas,
            recipient_email: self.recipient_email,
            category: self.category,
            archive_id: self.archive_id,
            created_at: self.created_at,
        }
    }
}

fn map_sqlx_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Database(db) => PortError::Constraint(db.message().to_string()),
        other => PortError::Network(other.to_string()),
    }
}

//=========================================================================================
// `ArchiveStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ArchiveStore for PgArchiveStore {
    async fn insert_archived_item(&self, item: &ArchivedItem) -> PortResult<String> {
        sqlx::query(
            "INSERT INTO polished_ideas \
             (id, user_id, title, original_notes, polished_outline, expansion_ideas, \
              recipient_email, category, archive_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(Uuid::new_v4())
        .bind(item.user_id)
        .bind(&item.title)
        .bind(&item.original_notes)
        .bind(&item.polished_outline)
        .bind(&item.expansion_ideas)
        .bind(&item.recipient_email)
        .bind(&item.category)
        .bind(&item.archive_id)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(item.archive_id.clone())
    }

    async fn list_history(&self, user_id: Uuid) -> PortResult<Vec<ArchivedItem>> {
        let records = sqlx::query_as::<_, ArchivedItemRecord>(
            "SELECT user_id, title, original_notes, polished_outline, expansion_ideas, \
                    recipient_email, category, archive_id, created_at \
             FROM polished_ideas WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
