use crate::transfer::request::TransferRequest;
use async_trait::async_trait;

/// What came back from the endpoint, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below HTTP: the request never produced a status line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transport error: {0}")]
    Other(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &TransferRequest,
        endpoint: &str,
    ) -> Result<TransportResponse, TransportError>;
}
