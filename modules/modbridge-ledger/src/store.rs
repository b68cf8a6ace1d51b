//! Ledger: append-only record of handled mailbox items, backed by SQLite.
//!
//! One row per seen item. Roots carry a ticket id and a NULL parent;
//! replies carry a parent and a NULL ticket id. There are no UPDATE or
//! DELETE statements anywhere in this crate: the ledger is a monotonic
//! log of "seen" facts, which is what makes retrying external calls safe.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::error::ErrorKind;
use std::str::FromStr;
use tracing::info;

use crate::error::LedgerError;

/// Append-only dedup store. The only mutable state the bridge owns.
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Open (creating if missing) the ledger database.
    ///
    /// A single connection: the bridge assumes exactly one writer process,
    /// and `sqlite::memory:` databases are per-connection.
    pub async fn connect(url: &str) -> Result<Self, LedgerError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // No recycling: an in-memory ledger lives and dies with its
        // connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Idempotent schema setup, run from main before the first cycle.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        info!("Running ledger migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS handled_items (
                comment_id        TEXT    PRIMARY KEY,
                parent_comment_id TEXT,
                ticket_id         INTEGER,
                CHECK (
                    (parent_comment_id IS NULL AND ticket_id IS NOT NULL)
                    OR (parent_comment_id IS NOT NULL AND ticket_id IS NULL)
                )
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS uq_handled_items_parent_comment
            ON handled_items (parent_comment_id, comment_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Ledger schema ready");
        Ok(())
    }

    /// The ticket created for a root item, or None if the root is unseen.
    pub async fn ticket_for_root(&self, item_id: &str) -> Result<Option<i64>, LedgerError> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT ticket_id FROM handled_items
            WHERE parent_comment_id IS NULL AND comment_id = ?
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    /// Whether a reply under the given root has already been bridged.
    pub async fn reply_processed(
        &self,
        parent_id: &str,
        item_id: &str,
    ) -> Result<bool, LedgerError> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT 1 FROM handled_items
            WHERE parent_comment_id = ? AND comment_id = ?
            "#,
        )
        .bind(parent_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Record that a ticket exists for a root item.
    pub async fn record_root(&self, item_id: &str, ticket_id: i64) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO handled_items (parent_comment_id, comment_id, ticket_id)
            VALUES (NULL, ?, ?)
            "#,
        )
        .bind(item_id)
        .bind(ticket_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, item_id))?;

        Ok(())
    }

    /// Record that a reply has been bridged into its root's ticket.
    pub async fn record_reply(&self, parent_id: &str, item_id: &str) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO handled_items (parent_comment_id, comment_id, ticket_id)
            VALUES (?, ?, NULL)
            "#,
        )
        .bind(parent_id)
        .bind(item_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, item_id))?;

        Ok(())
    }

    /// Reverse lookup: the root item whose ticket is `ticket_id`, used to
    /// translate a ticket back into its originating thread address.
    pub async fn source_address_for_ticket(
        &self,
        ticket_id: i64,
    ) -> Result<Option<String>, LedgerError> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT comment_id FROM handled_items
            WHERE parent_comment_id IS NULL AND ticket_id = ?
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }
}

fn map_insert_err(e: sqlx::Error, item_id: &str) -> LedgerError {
    match &e {
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation => LedgerError::Duplicate {
                item_id: item_id.to_string(),
            },
            ErrorKind::CheckViolation => LedgerError::Constraint(db.message().to_string()),
            _ => LedgerError::Database(e),
        },
        _ => LedgerError::Database(e),
    }
}
