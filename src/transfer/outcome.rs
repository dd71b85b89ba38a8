use crate::error::ErrorKind;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub class: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "request was superseded", false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Success {
        predicted_class: String,
        confidence: f64,
        all_predictions: Vec<Prediction>,
    },
    Failure(Failure),
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success { .. })
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            TransferOutcome::Failure(failure) => Some(failure),
            TransferOutcome::Success { .. } => None,
        }
    }
}

impl From<Failure> for TransferOutcome {
    fn from(failure: Failure) -> Self {
        TransferOutcome::Failure(failure)
    }
}
