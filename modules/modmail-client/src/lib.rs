pub mod error;
pub mod types;

pub use error::{ModmailError, Result};
pub use types::{Conversation, Message, NewMessage};

use std::time::Duration;

pub struct ModmailClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ModmailClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// List conversations, newest activity first as far as the service
    /// honors it. The ordering is not part of the service's contract.
    pub async fn conversations(&self, limit: u32) -> Result<Vec<Conversation>> {
        let url = format!("{}/api/conversations?limit={}", self.base_url, limit);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ModmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let conversations: Vec<Conversation> = resp.json().await?;
        Ok(conversations)
    }

    /// Messages of one conversation, oldest first. The root post itself
    /// is not included.
    pub async fn messages(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let url = format!(
            "{}/api/conversations/{}/messages",
            self.base_url, conversation_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ModmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let messages: Vec<Message> = resp.json().await?;
        Ok(messages)
    }

    /// Append a message to a conversation as the token's account.
    pub async fn post_message(&self, conversation_id: &str, body: &str) -> Result<()> {
        let url = format!(
            "{}/api/conversations/{}/messages",
            self.base_url, conversation_id
        );
        let payload = NewMessage {
            body: body.to_string(),
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ModmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(conversation_id, "Posted message");
        Ok(())
    }
}
