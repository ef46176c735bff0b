use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Non-2xx response, unusable body or transport failure. The message is
    /// meant to be shown to the user as-is.
    #[error("{0}")]
    RequestFailed(String),

    /// Superseded by a newer request from the same owner. Never surfaced.
    #[error("request canceled")]
    Canceled,
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::RequestFailed(format!("Network error: {}", e))
    }
}
