use crate::transfer::outcome::Failure;
use std::fmt;

/// Stable, machine-checkable failure category carried by every `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoInput,
    EncodeFailure,
    TooLarge,
    UnsupportedType,
    Network,
    RemoteRejected,
    MalformedResponse,
    Busy,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NoInput => "no_input",
            ErrorKind::EncodeFailure => "encode_failure",
            ErrorKind::TooLarge => "too_large",
            ErrorKind::UnsupportedType => "unsupported_type",
            ErrorKind::Network => "network",
            ErrorKind::RemoteRejected => "remote_rejected",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Busy => "busy",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised before a transfer starts. None of them is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("no image provided: {0}")]
    NoInput(String),
    #[error("failed to encode captured frame: {0}")]
    EncodeFailure(String),
    #[error("image is {size_bytes} bytes, the limit is {max_size_bytes} bytes")]
    TooLarge {
        size_bytes: usize,
        max_size_bytes: usize,
    },
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("a submission is already pending")]
    Busy,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NoInput(_) => ErrorKind::NoInput,
            PipelineError::EncodeFailure(_) => ErrorKind::EncodeFailure,
            PipelineError::TooLarge { .. } => ErrorKind::TooLarge,
            PipelineError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            PipelineError::Busy => ErrorKind::Busy,
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure::new(self.kind(), self.to_string(), false)
    }
}
