use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation root from `GET /api/conversations`.
#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub author: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A message inside a conversation, from
/// `GET /api/conversations/{id}/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub author: String,
    pub body: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Payload for `POST /api/conversations/{id}/messages`. The service
/// attributes the message to the token's account.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub body: String,
}
