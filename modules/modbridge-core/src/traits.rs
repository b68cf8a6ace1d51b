use crate::types::{HistoryEntry, MarkedTicket, Reply, ThreadRoot};
use async_trait::async_trait;

/// Read/write access to the moderation mailbox.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    /// List thread roots, newest activity first as far as the backend
    /// honors it. The ordering is an optimization, never a guarantee.
    async fn list_roots(&self, max: u32) -> anyhow::Result<Vec<ThreadRoot>>;

    /// Replies of one thread, oldest first.
    async fn replies(&self, root_id: &str) -> anyhow::Result<Vec<Reply>>;

    /// Post a reply into the thread, as the bridge's own account.
    async fn post_reply(&self, root_id: &str, body: &str) -> anyhow::Result<()>;
}

/// Access to the ticket tracker. Tickets are owned by the tracker;
/// the bridge only mutates them through this seam.
#[async_trait]
pub trait TicketTracker: Send + Sync {
    /// Create a ticket and return its id. Ids are positive; callers
    /// must treat anything below 1 as a backend fault.
    async fn create_ticket(&self, queue: i64, subject: &str, body: &str) -> anyhow::Result<i64>;

    async fn add_comment(&self, ticket_id: i64, body: &str) -> anyhow::Result<()>;

    async fn status(&self, ticket_id: i64) -> anyhow::Result<String>;

    async fn set_status(&self, ticket_id: i64, status: &str) -> anyhow::Result<()>;

    /// Full transaction history of a ticket, oldest first.
    async fn history(&self, ticket_id: i64) -> anyhow::Result<Vec<HistoryEntry>>;

    /// Tickets whose marker custom field is non-empty, newest updated
    /// first.
    async fn search_by_marker(&self, field: &str) -> anyhow::Result<Vec<MarkedTicket>>;

    /// Blank out the marker custom field.
    async fn clear_marker(&self, ticket_id: i64, field: &str) -> anyhow::Result<()>;
}
