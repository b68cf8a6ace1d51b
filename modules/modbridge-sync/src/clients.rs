//! Live REST clients bound to the engine's seams.

use anyhow::Result;
use async_trait::async_trait;

use modbridge_core::{
    HistoryEntry, HistoryKind, MarkedTicket, Reply, ThreadRoot, ThreadSource, TicketTracker,
};
use modmail_client::ModmailClient;
use rt_client::{RtClient, Transaction};

/// The moderation mailbox, spoken to over its REST API.
pub struct MailboxSource {
    client: ModmailClient,
}

impl MailboxSource {
    pub fn new(client: ModmailClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ThreadSource for MailboxSource {
    async fn list_roots(&self, max: u32) -> Result<Vec<ThreadRoot>> {
        let conversations = self.client.conversations(max).await?;
        Ok(conversations
            .into_iter()
            .map(|c| ThreadRoot {
                id: c.id,
                author: c.author,
                subject: c.subject,
                body: c.body,
                created_at: c.created_at,
            })
            .collect())
    }

    async fn replies(&self, root_id: &str) -> Result<Vec<Reply>> {
        let messages = self.client.messages(root_id).await?;
        Ok(messages
            .into_iter()
            .map(|m| Reply {
                id: m.id,
                author: m.author,
                body: m.body,
                created_at: m.created_at,
            })
            .collect())
    }

    async fn post_reply(&self, root_id: &str, body: &str) -> Result<()> {
        Ok(self.client.post_message(root_id, body).await?)
    }
}

/// The ticket tracker, spoken to over its REST API.
pub struct TrackerClient {
    client: RtClient,
}

impl TrackerClient {
    pub fn new(client: RtClient) -> Self {
        Self { client }
    }
}

// The tracker reports transaction types as an open string set; only the
// kinds the engine interprets get their own variant.
fn history_kind(kind: &str) -> HistoryKind {
    match kind {
        "create" => HistoryKind::Create,
        "comment" => HistoryKind::Comment,
        "status" => HistoryKind::Status,
        "set-marker" => HistoryKind::SetMarker,
        _ => HistoryKind::Other,
    }
}

fn history_entry(tx: Transaction) -> HistoryEntry {
    HistoryEntry {
        kind: history_kind(&tx.kind),
        description: tx.description,
        old_value: tx.old_value,
        new_value: tx.new_value,
        at: tx.created,
    }
}

#[async_trait]
impl TicketTracker for TrackerClient {
    async fn create_ticket(&self, queue: i64, subject: &str, body: &str) -> Result<i64> {
        Ok(self.client.create_ticket(queue, subject, body).await?)
    }

    async fn add_comment(&self, ticket_id: i64, body: &str) -> Result<()> {
        Ok(self.client.comment(ticket_id, body).await?)
    }

    async fn status(&self, ticket_id: i64) -> Result<String> {
        Ok(self.client.ticket(ticket_id).await?.status)
    }

    async fn set_status(&self, ticket_id: i64, status: &str) -> Result<()> {
        Ok(self.client.set_status(ticket_id, status).await?)
    }

    async fn history(&self, ticket_id: i64) -> Result<Vec<HistoryEntry>> {
        let transactions = self.client.history(ticket_id).await?;
        Ok(transactions.into_iter().map(history_entry).collect())
    }

    async fn search_by_marker(&self, field: &str) -> Result<Vec<MarkedTicket>> {
        let matches = self.client.search_by_marker(field).await?;
        Ok(matches
            .into_iter()
            .map(|m| MarkedTicket {
                ticket_id: m.id,
                marker_value: m.marker_value,
            })
            .collect())
    }

    async fn clear_marker(&self, ticket_id: i64, field: &str) -> Result<()> {
        Ok(self.client.clear_custom_field(ticket_id, field).await?)
    }
}
