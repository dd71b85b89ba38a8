use crate::transfer::interface::{Transport, TransportError, TransportResponse};
use crate::transfer::request::{ModelSelector, RequestId, TransferRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum FakeReply {
    Response(TransportResponse),
    Error(TransportError),
    Delayed(Duration, Box<FakeReply>),
}

impl FakeReply {
    pub fn status(status: u16, body: &str) -> Self {
        FakeReply::Response(TransportResponse::new(status, body))
    }

    pub fn cat_prediction() -> Self {
        FakeReply::status(
            200,
            r#"{"success": true, "data": {"predicted_class": "cat", "confidence": 0.97,
                "all_predictions": [{"class": "cat", "confidence": 0.97},
                                    {"class": "dog", "confidence": 0.03}]}}"#,
        )
    }

    pub fn prediction(class: &str, confidence: f64) -> Self {
        let body = serde_json::json!({
            "success": true,
            "data": {
                "predicted_class": class,
                "confidence": confidence,
                "all_predictions": [{"class": class, "confidence": confidence}]
            }
        });
        FakeReply::status(200, &body.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub id: RequestId,
    pub attempt: u32,
    pub model: ModelSelector,
    pub size_bytes: usize,
}

/// Replies from a script. Once the script runs out the last reply repeats.
#[derive(Debug)]
pub struct TransportFake {
    script: Mutex<VecDeque<FakeReply>>,
    last: Mutex<Option<FakeReply>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<SeenRequest>>,
}

impl TransportFake {
    pub fn sequence(replies: Vec<FakeReply>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: FakeReply) -> Self {
        Self::sequence(vec![reply])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    pub fn seen_attempts(&self) -> Vec<u32> {
        self.seen().iter().map(|seen| seen.attempt).collect()
    }

    fn next_reply(&self) -> Result<FakeReply, TransportError> {
        let mut script = self
            .script
            .lock()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let mut last = self
            .last
            .lock()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        if let Some(reply) = script.pop_front() {
            *last = Some(reply.clone());
            return Ok(reply);
        }

        last.clone()
            .ok_or_else(|| TransportError::Other("no scripted reply".to_string()))
    }

    fn record(&self, request: &TransferRequest) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(SeenRequest {
                id: request.id,
                attempt: request.attempt,
                model: request.model,
                size_bytes: request.buffer.size_bytes(),
            });
        }
    }
}

#[async_trait]
impl Transport for TransportFake {
    async fn send(
        &self,
        request: &TransferRequest,
        _endpoint: &str,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.record(request);

        let mut reply = self.next_reply()?;
        loop {
            match reply {
                FakeReply::Response(response) => return Ok(response),
                FakeReply::Error(error) => return Err(error),
                FakeReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
