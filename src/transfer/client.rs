use crate::config::TransferConfig;
use crate::library::logger::interface::Logger;
use crate::transfer::classify::{classify_response, classify_transport_error};
use crate::transfer::interface::{Transport, TransportError};
use crate::transfer::outcome::{Failure, TransferOutcome};
use crate::transfer::request::TransferRequest;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the lifecycle of one request: attempts, per-attempt timeout,
/// backoff between retryable failures, and cancellation.
#[derive(Clone)]
pub struct TransferClient {
    config: TransferConfig,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl TransferClient {
    pub fn new(
        config: TransferConfig,
        transport: Arc<dyn Transport>,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        Self {
            config,
            transport,
            logger: logger.with_namespace("transfer"),
        }
    }

    /// Runs the request to a terminal outcome. Cancelling `cancel` drops the
    /// in-flight attempt or pending backoff and yields `Cancelled`.
    pub async fn submit(
        &self,
        mut request: TransferRequest,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> TransferOutcome {
        let backoff = self.config.backoff();
        let max_attempts = self.config.max_attempts.max(1);

        loop {
            let _ = self.logger.info(&format!(
                "Sending {} attempt {}/{} ({} bytes, model {})",
                request.id,
                request.attempt,
                max_attempts,
                request.buffer.size_bytes(),
                request.model
            ));

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(&request),
                outcome = self.attempt(&request, endpoint) => outcome,
            };

            let failure = match outcome {
                TransferOutcome::Failure(failure) => failure,
                success => {
                    let _ = self.logger.info(&format!("{} succeeded", request.id));
                    return success;
                }
            };

            if !failure.retryable || request.attempt >= max_attempts {
                let _ = self.logger.error(&format!(
                    "{} failed after {} attempt(s): {} ({})",
                    request.id, request.attempt, failure.message, failure.kind
                ));
                return TransferOutcome::Failure(failure);
            }

            let delay = backoff.delay(request.attempt);
            let _ = self.logger.warn(&format!(
                "{} attempt {}/{} failed: {} - retrying in {:?}",
                request.id, request.attempt, max_attempts, failure.message, delay
            ));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(&request),
                _ = tokio::time::sleep(delay) => {}
            }

            request = request.next_attempt();
        }
    }

    async fn attempt(&self, request: &TransferRequest, endpoint: &str) -> TransferOutcome {
        let sent = tokio::time::timeout(
            self.config.request_timeout,
            self.transport.send(request, endpoint),
        )
        .await
        .unwrap_or(Err(TransportError::Timeout));

        match sent {
            Ok(response) => classify_response(&response),
            Err(error) => TransferOutcome::Failure(classify_transport_error(&error)),
        }
    }

    fn cancelled(&self, request: &TransferRequest) -> TransferOutcome {
        let _ = self
            .logger
            .info(&format!("{} cancelled on attempt {}", request.id, request.attempt));
        TransferOutcome::Failure(Failure::cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::library::logger::impl_fake::LoggerFake;
    use crate::media::media_buffer::{MediaBuffer, MimeType, SourceKind};
    use crate::transfer::impl_fake::{FakeReply, TransportFake};
    use crate::transfer::request::{ModelSelector, RequestId};
    use std::time::Duration;

    const ENDPOINT: &str = "http://predictor.test/predict";

    fn config(max_attempts: u32) -> TransferConfig {
        TransferConfig {
            max_attempts,
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(5),
            backoff_jitter: false,
            request_timeout: Duration::from_secs(2),
        }
    }

    fn request() -> TransferRequest {
        let buffer = MediaBuffer::new(vec![7u8; 2048], MimeType::Jpeg, SourceKind::Upload, "a.jpg");
        TransferRequest::new(RequestId(1), buffer, ModelSelector::Resnet)
    }

    fn client(max_attempts: u32, transport: &Arc<TransportFake>) -> TransferClient {
        TransferClient::new(
            config(max_attempts),
            transport.clone(),
            Arc::new(LoggerFake::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));

        let outcome = client(3, &transport)
            .submit(request(), ENDPOINT, &CancellationToken::new())
            .await;

        assert!(outcome.is_success());
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.seen_attempts(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_with_always_failing_transport() {
        let transport = Arc::new(TransportFake::always(FakeReply::Error(
            TransportError::Connect("connection refused".into()),
        )));

        let outcome = client(3, &transport)
            .submit(request(), ENDPOINT, &CancellationToken::new())
            .await;

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::Network);
        assert!(failure.retryable);
        assert_eq!(transport.calls(), 3);
        assert_eq!(transport.seen_attempts(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_between_attempts() {
        let transport = Arc::new(TransportFake::always(FakeReply::Error(TransportError::Timeout)));
        let started = tokio::time::Instant::now();

        client(3, &transport)
            .submit(request(), ENDPOINT, &CancellationToken::new())
            .await;

        // 100ms after the first failure, 200ms after the second.
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_status_is_retried_then_succeeds() {
        let transport = Arc::new(TransportFake::sequence(vec![
            FakeReply::status(503, r#"{"error": "overloaded"}"#),
            FakeReply::status(429, r#"{"error": "slow down"}"#),
            FakeReply::cat_prediction(),
        ]));

        let outcome = client(3, &transport)
            .submit(request(), ENDPOINT, &CancellationToken::new())
            .await;

        assert!(outcome.is_success());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_rejection_is_not_retried() {
        let transport = Arc::new(TransportFake::always(FakeReply::status(
            400,
            r#"{"success": false, "error": "No image provided"}"#,
        )));

        let outcome = client(3, &transport)
            .submit(request(), ENDPOINT, &CancellationToken::new())
            .await;

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::RemoteRejected);
        assert_eq!(failure.message, "No image provided");
        assert!(!failure.retryable);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_is_not_retried() {
        let transport = Arc::new(TransportFake::always(FakeReply::status(
            200,
            r#"{"message": "Prediction successful"}"#,
        )));

        let outcome = client(3, &transport)
            .submit(request(), ENDPOINT, &CancellationToken::new())
            .await;

        assert_eq!(outcome.failure().unwrap().kind, ErrorKind::MalformedResponse);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_transport_times_out() {
        let transport = Arc::new(TransportFake::always(FakeReply::Delayed(
            Duration::from_secs(60),
            Box::new(FakeReply::cat_prediction()),
        )));

        let outcome = client(2, &transport)
            .submit(request(), ENDPOINT, &CancellationToken::new())
            .await;

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::Network);
        assert_eq!(failure.message, "request timed out");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = Arc::new(TransportFake::always(FakeReply::Error(TransportError::Timeout)));
        let client = TransferClient::new(
            TransferConfig {
                backoff_base: Duration::from_secs(30),
                ..config(3)
            },
            transport.clone(),
            Arc::new(LoggerFake::new()),
        );
        let cancel = CancellationToken::new();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move { client.submit(request(), ENDPOINT, &cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        let outcome = task.await.unwrap();

        assert_eq!(outcome.failure().unwrap().kind, ErrorKind::Cancelled);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_attempt() {
        let transport = Arc::new(TransportFake::always(FakeReply::Delayed(
            Duration::from_secs(1),
            Box::new(FakeReply::cat_prediction()),
        )));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = client(3, &transport).submit(request(), ENDPOINT, &cancel).await;

        assert_eq!(outcome.failure().unwrap().kind, ErrorKind::Cancelled);
    }
}
