use crate::transfer::interface::{Transport, TransportError, TransportResponse};
use crate::transfer::request::TransferRequest;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// Multipart POST over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// The `model` field goes first so the endpoint can pick a model before
/// reading the image part.
pub fn build_form(request: &TransferRequest) -> Result<Form, TransportError> {
    let buffer = &request.buffer;
    let image = Part::bytes(buffer.bytes().to_vec())
        .file_name(buffer.file_name().to_string())
        .mime_str(buffer.mime_type().as_str())
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

    Ok(Form::new()
        .text("model", request.model.as_str())
        .part("image", image))
}

fn classify_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &TransferRequest,
        endpoint: &str,
    ) -> Result<TransportResponse, TransportError> {
        let form = build_form(request)?;

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify_reqwest_error)?;

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}
