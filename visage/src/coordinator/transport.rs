//! Render transport abstraction.
//!
//! The coordinator talks to the cache gateway through this trait, which
//! allows dependency injection and mock transports in tests.

use serde::Deserialize;

use crate::cache::BoxFuture;
use crate::request::RenderPayload;

use thiserror::Error;

/// Default timeout for a single render round-trip.
///
/// Generous because a cache miss blocks on the hosted model; the
/// invoker's own poll deadline bounds the server side.
const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Errors surfaced by a render transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request never produced an HTTP response.
    #[error("render request failed: {0}")]
    Http(String),

    /// The gateway answered with a non-success status.
    #[error("render endpoint returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Submits quantized payloads and returns resolved image URLs.
pub trait RenderTransport: Send + Sync {
    /// Submit `payload` and return the rendered asset's URL.
    fn render(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<String, TransportError>>;
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RenderErrorBody {
    error: String,
}

/// HTTP transport posting to the gateway's `/replicate` endpoint.
pub struct HttpRenderTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRenderTransport {
    /// Create a transport for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(endpoint, std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport with a custom request timeout.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl RenderTransport for HttpRenderTransport {
    fn render(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<String, TransportError>> {
        let body = serde_json::to_value(payload).expect("payload serialization is infallible");
        Box::pin(async move {
            let response = self
                .client
                .post(&self.endpoint)
                .json(&body)
                .send()
                .await
                .map_err(|e| TransportError::Http(format!("request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<RenderErrorBody>(&text)
                    .map(|b| b.error)
                    .unwrap_or(text);
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: RenderResponse = response
                .json()
                .await
                .map_err(|e| TransportError::Http(format!("failed to read response: {e}")))?;
            Ok(parsed.url)
        })
    }
}
