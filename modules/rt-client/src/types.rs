use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// The tracker's JSON surface keeps RT's capitalized field names.

/// Payload for `POST /tickets`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTicket {
    #[serde(rename = "Queue")]
    pub queue: i64,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Content")]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTicket {
    #[serde(rename = "Id")]
    pub id: i64,
}

/// Payload for `POST /tickets/{id}/comment`.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    #[serde(rename = "Content")]
    pub content: String,
}

/// Ticket metadata from `GET /tickets/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketInfo {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Queue")]
    pub queue: i64,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// Payload for `PUT /tickets/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TicketUpdate {
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "CustomFields", skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<HashMap<String, String>>,
}

/// One transaction from `GET /tickets/{id}/history`, oldest first.
///
/// `Type` is an open string set; the bridge interprets a handful of
/// values and ignores the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "OldValue")]
    pub old_value: Option<String>,
    #[serde(rename = "NewValue")]
    pub new_value: Option<String>,
    #[serde(rename = "Created")]
    pub created: DateTime<Utc>,
}

/// One hit from `GET /tickets?marker={field}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerMatch {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "MarkerValue")]
    pub marker_value: String,
}
