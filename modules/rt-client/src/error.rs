use thiserror::Error;

pub type Result<T> = std::result::Result<T, RtError>;

#[derive(Debug, Error)]
pub enum RtError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RtError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RtError::Malformed(err.to_string())
        } else {
            RtError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RtError {
    fn from(err: serde_json::Error) -> Self {
        RtError::Malformed(err.to_string())
    }
}
