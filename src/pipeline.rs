use crate::config::Config;
use crate::device_camera::capture_session::capture_once;
use crate::device_camera::interface::DeviceCamera;
use crate::error::PipelineError;
use crate::library::logger::interface::Logger;
use crate::media::media_buffer::MediaBuffer;
use crate::media::media_source::{acquire_from_capture, acquire_from_file, acquire_from_path, FileInput};
use crate::media::validator::validate;
use crate::result_channel::channel::ResultChannel;
use crate::transfer::client::TransferClient;
use crate::transfer::interface::Transport;
use crate::transfer::request::{ModelSelector, RequestId};
use std::path::Path;
use std::sync::Arc;

/// Acquire, validate, then hand the buffer to the result channel.
///
/// Failures before the transfer settle the channel as well as being
/// returned, so whoever renders the channel sees them too.
pub struct Pipeline {
    config: Config,
    channel: ResultChannel,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Self {
        let client = TransferClient::new(config.transfer.clone(), transport, logger.clone());
        let channel = ResultChannel::new(&config, client, logger.clone());
        Self {
            config,
            channel,
            logger: logger.with_namespace("pipeline"),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn channel(&self) -> &ResultChannel {
        &self.channel
    }

    pub fn submit_file(
        &self,
        input: Option<FileInput>,
        model: ModelSelector,
    ) -> Result<RequestId, PipelineError> {
        let buffer = acquire_from_file(input).map_err(|e| self.reject(e))?;
        self.submit_buffer(buffer, model)
    }

    pub fn submit_path(&self, path: &Path, model: ModelSelector) -> Result<RequestId, PipelineError> {
        let buffer = acquire_from_path(path).map_err(|e| self.reject(e))?;
        self.submit_buffer(buffer, model)
    }

    /// The camera is released before this returns, success or not.
    pub fn submit_capture(
        &self,
        camera: &dyn DeviceCamera,
        model: ModelSelector,
    ) -> Result<RequestId, PipelineError> {
        let frame = capture_once(camera, self.logger.clone())
            .map_err(|e| self.reject(PipelineError::NoInput(e.to_string())))?;
        let buffer = acquire_from_capture(frame).map_err(|e| self.reject(e))?;
        self.submit_buffer(buffer, model)
    }

    pub fn submit_buffer(
        &self,
        buffer: MediaBuffer,
        model: ModelSelector,
    ) -> Result<RequestId, PipelineError> {
        let buffer = validate(buffer, &self.config.validation).map_err(|e| self.reject(e))?;

        let _ = self.logger.info(&format!(
            "Submitting {} ({}, {} bytes, {:?}) to {}",
            buffer.file_name(),
            buffer.mime_type(),
            buffer.size_bytes(),
            buffer.source_kind(),
            model
        ));

        self.channel.submit(buffer, model)
    }

    fn reject(&self, error: PipelineError) -> PipelineError {
        let _ = self.logger.warn(&format!("Rejected before transfer: {}", error));
        if let Err(busy) = self.channel.reject(error.to_failure()) {
            let _ = self
                .logger
                .warn(&format!("Rejection not published: {}", busy));
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupersedePolicy;
    use crate::device_camera::impl_fake::DeviceCameraFake;
    use crate::error::ErrorKind;
    use crate::library::logger::impl_fake::LoggerFake;
    use crate::media::media_buffer::{MimeType, SourceKind};
    use crate::result_channel::core::State;
    use crate::transfer::impl_fake::{FakeReply, TransportFake};
    use std::time::Duration;

    fn pipeline(config: Config, transport: &Arc<TransportFake>) -> Pipeline {
        Pipeline::new(config, transport.clone(), Arc::new(LoggerFake::new()))
    }

    fn settled_kind(pipeline: &Pipeline) -> Option<ErrorKind> {
        match pipeline.channel().current() {
            State::Settled { outcome, .. } => outcome.failure().map(|failure| failure.kind),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_upload_never_reaches_transport() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));
        let pipeline = pipeline(Config::default(), &transport);

        let result = pipeline.submit_file(
            Some(FileInput {
                bytes: vec![0u8; 6 * 1024 * 1024],
                declared_type: Some("image/jpeg".to_string()),
                file_name: Some("big.jpg".to_string()),
            }),
            ModelSelector::Cnn,
        );

        assert!(matches!(result, Err(PipelineError::TooLarge { .. })));
        assert_eq!(settled_kind(&pipeline), Some(ErrorKind::TooLarge));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_type_is_rejected() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));
        let pipeline = pipeline(Config::default(), &transport);

        let result = pipeline.submit_file(
            Some(FileInput {
                bytes: b"hello".to_vec(),
                declared_type: Some("text/plain".to_string()),
                file_name: Some("notes.txt".to_string()),
            }),
            ModelSelector::Cnn,
        );

        assert_eq!(result.unwrap_err().kind(), ErrorKind::UnsupportedType);
        assert_eq!(settled_kind(&pipeline), Some(ErrorKind::UnsupportedType));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_file_is_no_input() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));
        let pipeline = pipeline(Config::default(), &transport);

        let result = pipeline.submit_file(None, ModelSelector::Cnn);

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NoInput);
        assert_eq!(settled_kind(&pipeline), Some(ErrorKind::NoInput));
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_settles_with_prediction() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));
        let pipeline = pipeline(Config::default(), &transport);

        let id = pipeline
            .submit_buffer(
                MediaBuffer::new(vec![3u8; 2048], MimeType::Jpeg, SourceKind::Upload, "cat.jpg"),
                ModelSelector::Resnet,
            )
            .unwrap();
        let outcome = pipeline.channel().outcome_of(id).await.unwrap();

        assert!(outcome.is_success());
        let seen = transport.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, ModelSelector::Resnet);
        assert_eq!(seen[0].size_bytes, 2048);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_releases_camera_and_uploads_png() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));
        let pipeline = pipeline(Config::default(), &transport);
        let camera = DeviceCameraFake::new(10, 10, [255, 0, 0]);

        let id = pipeline.submit_capture(&camera, ModelSelector::Cnn).unwrap();

        assert_eq!(camera.open_count(), 1);
        assert_eq!(camera.close_count(), 1);
        assert!(!camera.is_open());
        assert!(pipeline.channel().outcome_of(id).await.unwrap().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_failure_still_releases_camera() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));
        let pipeline = pipeline(Config::default(), &transport);
        let camera = DeviceCameraFake::new(10, 10, [0, 0, 0]).failing_capture();

        let result = pipeline.submit_capture(&camera, ModelSelector::Cnn);

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NoInput);
        assert_eq!(camera.close_count(), 1);
        assert!(!camera.is_open());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_camera_is_no_input() {
        let transport = Arc::new(TransportFake::always(FakeReply::cat_prediction()));
        let pipeline = pipeline(Config::default(), &transport);
        let camera = DeviceCameraFake::new(10, 10, [0, 0, 0]).failing_open();

        let result = pipeline.submit_capture(&camera, ModelSelector::Cnn);

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NoInput);
        assert_eq!(camera.open_count(), 0);
        assert_eq!(settled_kind(&pipeline), Some(ErrorKind::NoInput));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_while_busy_keeps_pending_request() {
        let transport = Arc::new(TransportFake::always(FakeReply::Delayed(
            Duration::from_secs(1),
            Box::new(FakeReply::cat_prediction()),
        )));
        let config = Config {
            supersede_policy: SupersedePolicy::RejectWhileBusy,
            ..Config::default()
        };
        let pipeline = pipeline(config, &transport);

        let id = pipeline
            .submit_buffer(
                MediaBuffer::new(vec![3u8; 64], MimeType::Png, SourceKind::Upload, "a.png"),
                ModelSelector::Cnn,
            )
            .unwrap();
        let result = pipeline.submit_file(None, ModelSelector::Cnn);

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NoInput);
        assert_eq!(pipeline.channel().current().pending_id(), Some(id));
        assert!(pipeline.channel().outcome_of(id).await.unwrap().is_success());
    }
}
