//! Image service clients

use crate::error::PipelineError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Client, Url};
use std::time::Duration;
use sv_core::{FormSnapshot, Payload};
use tracing::debug;

/// Endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:80/draw";

/// Something that turns a form snapshot into an image
#[async_trait]
pub trait ImageService: Send + Sync + 'static {
    /// Issue exactly one request for `snapshot`
    ///
    /// No retries; each call is independent.
    async fn draw(&self, snapshot: &FormSnapshot) -> Result<Payload, PipelineError>;
}

/// Image service reached over HTTP
///
/// Sends every snapshot field as a multipart form part in a single `POST`.
#[derive(Debug, Clone)]
pub struct HttpImageService {
    client: Client,
    endpoint: Url,
}

impl HttpImageService {
    /// Create a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, PipelineError> {
        let endpoint = Url::parse(endpoint).map_err(|e| PipelineError::Endpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn draw(&self, snapshot: &FormSnapshot) -> Result<Payload, PipelineError> {
        let form = snapshot
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.to_string(), value.to_string())
            });

        debug!("POST {} ({} fields)", self.endpoint, snapshot.len());

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(PipelineError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        debug!("Received {} bytes ({:?})", bytes.len(), content_type);
        Ok(Payload::new(bytes, content_type))
    }
}
