use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Source-side entities ---

/// The first message of a conversation in the moderation mailbox.
///
/// Immutable once observed, except that its reply sequence may grow; replies
/// are fetched separately through [`crate::traits::ThreadSource::replies`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRoot {
    /// Opaque token assigned by the source. Globally unique across roots
    /// and replies.
    pub id: String,
    pub author: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A subsequent message attached to exactly one [`ThreadRoot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// --- Tracker-side entities ---

/// What a ticket history transaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryKind {
    Create,
    Comment,
    Status,
    SetMarker,
    /// Anything the engine does not interpret (mail records, owner
    /// changes, ...). Kept so unknown backend transaction types never
    /// fail a history fetch.
    #[serde(other)]
    Other,
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryKind::Create => write!(f, "create"),
            HistoryKind::Comment => write!(f, "comment"),
            HistoryKind::Status => write!(f, "status"),
            HistoryKind::SetMarker => write!(f, "set-marker"),
            HistoryKind::Other => write!(f, "other"),
        }
    }
}

/// One entry of a ticket's ordered history, oldest first.
///
/// For `Comment` entries the comment body is carried in `description`;
/// for `SetMarker` entries the marker text is carried in `new_value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub description: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub at: DateTime<Utc>,
}

/// A ticket carrying a non-empty outbound-reply marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkedTicket {
    pub ticket_id: i64,
    pub marker_value: String,
}
