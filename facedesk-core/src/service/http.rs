//! HTTP client for the recognition service.
//!
//! One request per call, no retries. Non-2xx answers become
//! [`FacedeskError::Service`] carrying the service's `detail`; failures with no
//! response become [`FacedeskError::Transport`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::FaceService;
use crate::config::{SessionConfig, DEFAULT_API_URL};
use crate::error::{FacedeskError, Result};
use crate::model::{
    EnrolledPerson, ErrorBody, PersonRecord, PersonsBody, RecognitionOutcome, RecognizeBody, Stats,
    StatsBody, Still,
};

/// Configuration for the service HTTP client.
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Service origin, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Request timeout. `None` leaves timing to the transport.
    pub timeout: Option<Duration>,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: None,
        }
    }
}

impl From<&SessionConfig> for HttpServiceConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            timeout: config.http_timeout,
        }
    }
}

/// `DELETE /person/{name}` response body.
#[derive(Debug, Deserialize)]
struct RemoveBody {
    #[serde(default)]
    message: Option<String>,
}

/// [`FaceService`] over HTTP.
pub struct HttpFaceService {
    client: Client,
    base_url: Url,
}

impl HttpFaceService {
    /// Create a client for the service at `config.base_url`.
    #[instrument(level = "debug", skip_all, fields(base_url = %config.base_url))]
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| FacedeskError::Config(format!("Invalid base URL: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(FacedeskError::Config(format!(
                "Base URL must be an http(s) origin: {base_url}"
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            warn!(error = %e, "Failed to create HTTP client");
            FacedeskError::Config(format!("Failed to create HTTP client: {e}"))
        })?;

        info!("Recognition service client created");
        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL under the base, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FacedeskError::Config("Base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send once and decode a 2xx JSON body into `T`.
    async fn send<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let start = Instant::now();

        let response = request.send().await.map_err(|e| {
            warn!(
                error = %e,
                latency_ms = start.elapsed().as_millis() as u64,
                "No response from service"
            );
            FacedeskError::Transport(e.to_string())
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::detail_text);
            warn!(
                status = %status,
                detail = detail.as_deref().unwrap_or(""),
                latency_ms = start.elapsed().as_millis() as u64,
                "Service rejected request"
            );
            return Err(FacedeskError::Service {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.json::<T>().await.map_err(|e| {
            warn!(error = %e, "Failed to read response body");
            if e.is_decode() {
                FacedeskError::InvalidResponse(e.to_string())
            } else {
                FacedeskError::Transport(e.to_string())
            }
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed successfully"
        );
        Ok(body)
    }
}

fn file_part(still: Still) -> Result<Part> {
    Part::bytes(still.bytes)
        .file_name(still.filename)
        .mime_str(&still.content_type)
        .map_err(|e| FacedeskError::Validation(format!("Invalid content type: {e}")))
}

#[async_trait]
impl FaceService for HttpFaceService {
    #[instrument(level = "info", skip(self, still), fields(bytes = still.bytes.len()))]
    async fn register(&self, name: &str, still: Still) -> Result<EnrolledPerson> {
        let form = Form::new()
            .text("name", name.to_string())
            .part("file", file_part(still)?);
        let url = self.endpoint(&["register"])?;
        let enrolled: EnrolledPerson = self.send(self.client.post(url).multipart(form)).await?;
        info!(name = %enrolled.name, "Person registered");
        Ok(enrolled)
    }

    #[instrument(level = "info", skip(self, still), fields(bytes = still.bytes.len()))]
    async fn recognize(&self, still: Still) -> Result<RecognitionOutcome> {
        let form = Form::new().part("file", file_part(still)?);
        let url = self.endpoint(&["recognize"])?;
        let body: RecognizeBody = self.send(self.client.post(url).multipart(form)).await?;
        let outcome = RecognitionOutcome::try_from(body).map_err(FacedeskError::InvalidResponse)?;
        info!(
            recognized = outcome.is_recognized(),
            confidence = outcome.confidence_percent(),
            "Recognition finished"
        );
        Ok(outcome)
    }

    #[instrument(level = "debug", skip(self))]
    async fn stats(&self) -> Result<Stats> {
        let url = self.endpoint(&["stats"])?;
        let body: StatsBody = self.send(self.client.get(url)).await?;
        Ok(body.into())
    }

    #[instrument(level = "debug", skip(self))]
    async fn persons(&self) -> Result<Vec<PersonRecord>> {
        let url = self.endpoint(&["persons"])?;
        let body: PersonsBody = self.send(self.client.get(url)).await?;
        Ok(body.persons)
    }

    #[instrument(level = "info", skip(self))]
    async fn remove_person(&self, name: &str) -> Result<String> {
        let url = self.endpoint(&["person", name])?;
        let body: RemoveBody = self.send(self.client.delete(url)).await?;
        Ok(body.message.unwrap_or_else(|| format!("{name} removed")))
    }
}
