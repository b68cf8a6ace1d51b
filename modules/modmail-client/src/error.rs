use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModmailError>;

#[derive(Debug, Error)]
pub enum ModmailError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ModmailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ModmailError::Malformed(err.to_string())
        } else {
            ModmailError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ModmailError {
    fn from(err: serde_json::Error) -> Self {
        ModmailError::Malformed(err.to_string())
    }
}
