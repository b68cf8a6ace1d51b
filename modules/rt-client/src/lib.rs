pub mod error;
pub mod types;

pub use error::{Result, RtError};
pub use types::{
    CreatedTicket, MarkerMatch, NewComment, NewTicket, TicketInfo, TicketUpdate, Transaction,
};

use std::collections::HashMap;
use std::time::Duration;

pub struct RtClient {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

impl RtClient {
    pub fn new(base_url: &str, user: &str, password: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    /// Create a ticket, returning its id as reported by the tracker.
    pub async fn create_ticket(&self, queue: i64, subject: &str, content: &str) -> Result<i64> {
        let payload = NewTicket {
            queue,
            subject: subject.to_string(),
            content: content.to_string(),
        };

        let url = format!("{}/tickets", self.base_url);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RtError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedTicket = resp.json().await?;
        tracing::debug!(ticket_id = created.id, queue, "Created ticket");
        Ok(created.id)
    }

    /// Add a comment to a ticket's history.
    pub async fn comment(&self, ticket_id: i64, content: &str) -> Result<()> {
        let payload = NewComment {
            content: content.to_string(),
        };

        let url = format!("{}/tickets/{}/comment", self.base_url, ticket_id);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RtError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    pub async fn ticket(&self, ticket_id: i64) -> Result<TicketInfo> {
        let url = format!("{}/tickets/{}", self.base_url, ticket_id);
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RtError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let info: TicketInfo = resp.json().await?;
        Ok(info)
    }

    pub async fn set_status(&self, ticket_id: i64, status: &str) -> Result<()> {
        self.update(
            ticket_id,
            TicketUpdate {
                status: Some(status.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Blank out a custom field.
    pub async fn clear_custom_field(&self, ticket_id: i64, field: &str) -> Result<()> {
        self.update(
            ticket_id,
            TicketUpdate {
                custom_fields: Some(HashMap::from([(field.to_string(), String::new())])),
                ..Default::default()
            },
        )
        .await
    }

    async fn update(&self, ticket_id: i64, payload: TicketUpdate) -> Result<()> {
        let url = format!("{}/tickets/{}", self.base_url, ticket_id);
        let resp = self
            .client
            .put(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RtError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// Full transaction history of a ticket, oldest first.
    pub async fn history(&self, ticket_id: i64) -> Result<Vec<Transaction>> {
        let url = format!("{}/tickets/{}/history", self.base_url, ticket_id);
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RtError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let transactions: Vec<Transaction> = resp.json().await?;
        Ok(transactions)
    }

    /// Tickets whose `field` custom field is non-empty, newest updated
    /// first.
    pub async fn search_by_marker(&self, field: &str) -> Result<Vec<MarkerMatch>> {
        let url = format!("{}/tickets?marker={}", self.base_url, field);
        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RtError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let matches: Vec<MarkerMatch> = resp.json().await?;
        Ok(matches)
    }
}
