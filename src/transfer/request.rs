use crate::media::media_buffer::MediaBuffer;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Models the prediction endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelector {
    #[default]
    Cnn,
    Mobilenet,
    Resnet,
}

impl ModelSelector {
    pub const ALL: [ModelSelector; 3] = [
        ModelSelector::Cnn,
        ModelSelector::Mobilenet,
        ModelSelector::Resnet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSelector::Cnn => "cnn",
            ModelSelector::Mobilenet => "mobilenet",
            ModelSelector::Resnet => "resnet",
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model '{0}', expected one of cnn, mobilenet, resnet")]
pub struct UnknownModel(pub String);

impl FromStr for ModelSelector {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelSelector::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownModel(s.to_string()))
    }
}

/// One submission of a buffer to the predictor. `attempt` starts at 1 and
/// grows with every retry.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub id: RequestId,
    pub buffer: MediaBuffer,
    pub model: ModelSelector,
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
}

impl TransferRequest {
    pub fn new(id: RequestId, buffer: MediaBuffer, model: ModelSelector) -> Self {
        Self {
            id,
            buffer,
            model,
            attempt: 1,
            created_at: Utc::now(),
        }
    }

    pub fn next_attempt(mut self) -> Self {
        self.attempt += 1;
        self
    }
}
