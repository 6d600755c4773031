//! Hosted-model invocation.
//!
//! [`ModelInvoker`] submits an inference job to the external model host
//! and polls it at a fixed interval until it reaches a terminal status,
//! returning the first output asset URL. The poll loop enforces a
//! deadline so a stuck upstream job cannot stall the live channel or a
//! prefetch batch indefinitely. There is no retry at this layer — retry
//! policy belongs to callers (prefetch batches log and move on).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::BoxFuture;
use crate::request::RenderPayload;

/// Default interval between status polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default ceiling on a single invocation, submission to terminal status.
const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(120);

/// Errors surfaced by model invocation.
#[derive(Debug, Error)]
pub enum InvokerError {
    /// The model host request never produced a response.
    #[error("model host request failed: {0}")]
    Http(String),

    /// The prediction reached a terminal failure status.
    #[error("prediction failed: {0}")]
    PredictionFailed(String),

    /// The prediction succeeded but produced no output assets.
    #[error("prediction produced no output")]
    EmptyOutput,

    /// The prediction did not reach a terminal status in time.
    #[error("prediction did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    /// The deployment identifier is not `owner/name`.
    #[error("invalid deployment identifier: {0}")]
    InvalidDeployment(String),
}

/// Status of a hosted prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    /// Whether polling can stop.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

/// State of a hosted prediction as reported by the model host.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    /// The host reports a single URL or a list depending on the model;
    /// both normalize to a list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub output: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(url)) => vec![url],
        Some(OneOrMany::Many(urls)) => urls,
    })
}

/// Access to the hosted prediction API.
///
/// Abstracted so the gateway and tests can inject mock hosts.
pub trait PredictionHost: Send + Sync {
    /// Start a prediction for `payload` and return its initial state.
    fn create(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<Prediction, InvokerError>>;

    /// Fetch the current state of prediction `id`.
    fn fetch(&self, id: &str) -> BoxFuture<'_, Result<Prediction, InvokerError>>;
}

/// Runs a render through the model, hiding the submit/poll protocol.
///
/// Implemented by [`ModelInvoker`]; the gateway depends on this trait so
/// tests can count invocations.
pub trait ModelRunner: Send + Sync {
    fn run(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<String, InvokerError>>;
}

/// Configuration for the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct InvokerConfig {
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Ceiling on a single invocation, submission to terminal status.
    pub poll_deadline: Duration,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_deadline: DEFAULT_POLL_DEADLINE,
        }
    }
}

/// Submits inference jobs and polls them to completion.
pub struct ModelInvoker {
    host: Arc<dyn PredictionHost>,
    config: InvokerConfig,
}

impl ModelInvoker {
    /// Create an invoker with default poll settings.
    pub fn new(host: Arc<dyn PredictionHost>) -> Self {
        Self {
            host,
            config: InvokerConfig::default(),
        }
    }

    /// Create an invoker with custom poll settings.
    pub fn with_config(host: Arc<dyn PredictionHost>, config: InvokerConfig) -> Self {
        Self { host, config }
    }

    /// Run the model for `payload`, returning the first output URL.
    pub async fn invoke(&self, payload: &RenderPayload) -> Result<String, InvokerError> {
        let deadline = Instant::now() + self.config.poll_deadline;
        let mut prediction = self.host.create(payload).await?;
        debug!(id = %prediction.id, "prediction submitted");

        while !prediction.status.is_terminal() {
            if Instant::now() >= deadline {
                return Err(InvokerError::DeadlineExceeded(self.config.poll_deadline));
            }
            tokio::time::sleep(self.config.poll_interval).await;
            prediction = self.host.fetch(&prediction.id).await?;
        }

        match prediction.status {
            PredictionStatus::Succeeded => prediction
                .output
                .into_iter()
                .next()
                .ok_or(InvokerError::EmptyOutput),
            status => Err(InvokerError::PredictionFailed(
                prediction
                    .error
                    .unwrap_or_else(|| format!("terminal status {status:?}")),
            )),
        }
    }
}

impl ModelRunner for ModelInvoker {
    fn run(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<String, InvokerError>> {
        let payload = payload.clone();
        Box::pin(async move { self.invoke(&payload).await })
    }
}

/// HTTP prediction host for Replicate-style deployment APIs.
pub struct HttpPredictionHost {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    name: String,
    token: String,
}

impl HttpPredictionHost {
    const DEFAULT_API_BASE: &'static str = "https://api.replicate.com/v1";

    /// Create a host for a `owner/name` deployment identifier.
    pub fn for_deployment(
        deployment: &str,
        token: impl Into<String>,
    ) -> Result<Self, InvokerError> {
        let (owner, name) = deployment
            .split_once('/')
            .ok_or_else(|| InvokerError::InvalidDeployment(deployment.to_string()))?;
        if owner.is_empty() || name.is_empty() {
            return Err(InvokerError::InvalidDeployment(deployment.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| InvokerError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: Self::DEFAULT_API_BASE.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            token: token.into(),
        })
    }

    /// Override the API base URL (tests, self-hosted gateways).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn parse(response: reqwest::Response) -> Result<Prediction, InvokerError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InvokerError::Http(format!("HTTP {status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| InvokerError::Http(format!("failed to decode prediction: {e}")))
    }
}

impl PredictionHost for HttpPredictionHost {
    fn create(&self, payload: &RenderPayload) -> BoxFuture<'_, Result<Prediction, InvokerError>> {
        let body = serde_json::json!({ "input": payload });
        Box::pin(async move {
            let url = format!(
                "{}/deployments/{}/{}/predictions",
                self.api_base, self.owner, self.name
            );
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .await
                .map_err(|e| InvokerError::Http(format!("request failed: {e}")))?;
            Self::parse(response).await
        })
    }

    fn fetch(&self, id: &str) -> BoxFuture<'_, Result<Prediction, InvokerError>> {
        let id = id.to_string();
        Box::pin(async move {
            let url = format!("{}/predictions/{}", self.api_base, id);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| InvokerError::Http(format!("request failed: {e}")))?;
            Self::parse(response).await
        })
    }
}
