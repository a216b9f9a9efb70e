//! Request execution against HTML and JSON endpoints. Transport failures are
//! logged and the caller's continuation is not invoked.

use std::{sync::Arc, time::Duration};

use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde_json::Value;
use shared::{
    domain::FormData,
    protocol::{ActionOutcome, HttpMethod, RequestOutcome},
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::page::Notifier;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl BridgeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Send(reqwest::Error),
    #[error("server answered {status}")]
    Status { status: StatusCode },
    #[error("failed to read response body: {0}")]
    Body(reqwest::Error),
    #[error("response is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    pub fn status_text(&self) -> String {
        match self {
            Self::Status { status } => status.to_string(),
            Self::Send(err) | Self::Body(err) => err
                .status()
                .map(|status| status.to_string())
                .unwrap_or_else(|| "error".to_string()),
            Self::InvalidEndpoint { .. } => "invalid endpoint".to_string(),
            Self::Decode(_) => "parsererror".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub endpoint: String,
    pub method: HttpMethod,
    pub body: Option<FormData>,
}

impl BridgeRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            body: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: FormData) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Post,
            body: Some(body),
        }
    }
}

pub struct RequestBridge {
    http: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl RequestBridge {
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|source| BridgeError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn resolve(&self, endpoint: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(endpoint)
            .map_err(|source| TransportError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    pub async fn fetch_text(&self, request: &BridgeRequest) -> Result<String, TransportError> {
        let url = self.resolve(&request.endpoint)?;
        debug!(method = %request.method, %url, "dispatching request");

        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
        };
        if let Some(body) = post_body(request) {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        let response = builder.send().await.map_err(TransportError::Send)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status });
        }
        response.text().await.map_err(TransportError::Body)
    }

    pub async fn fetch_json(&self, request: &BridgeRequest) -> Result<Value, TransportError> {
        let text = self.fetch_text(request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// JSON-mode request. Failures are logged and yield `None`.
    pub async fn execute_async(&self, request: &BridgeRequest) -> Option<RequestOutcome> {
        match self.fetch_json(request).await {
            Ok(value) => Some(RequestOutcome::from_json(value)),
            Err(err) => {
                log_transport_failure(request, &err);
                None
            }
        }
    }

    /// Spawns a JSON-mode request; `continuation` runs only when an outcome
    /// was decoded.
    pub fn dispatch<F>(self: &Arc<Self>, request: BridgeRequest, continuation: F) -> JoinHandle<()>
    where
        F: FnOnce(RequestOutcome) + Send + 'static,
    {
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            if let Some(outcome) = bridge.execute_async(&request).await {
                continuation(outcome);
            }
        })
    }

    /// Blocking JSON-mode request.
    ///
    /// Blocks the calling thread for the whole round trip. Reserve it for
    /// short same-origin calls whose value is needed before continuing, and
    /// never call it from inside an async runtime worker.
    pub fn execute_sync(&self, request: &BridgeRequest) -> Option<RequestOutcome> {
        match self.fetch_json_blocking(request) {
            Ok(value) => Some(RequestOutcome::from_json(value)),
            Err(err) => {
                log_transport_failure(request, &err);
                None
            }
        }
    }

    fn fetch_json_blocking(&self, request: &BridgeRequest) -> Result<Value, TransportError> {
        let url = self.resolve(&request.endpoint)?;
        debug!(method = %request.method, %url, "dispatching blocking request");

        let mut client = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client.build().map_err(TransportError::Send)?;

        let mut builder = match request.method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
        };
        if let Some(body) = post_body(request) {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        let response = builder.send().map_err(TransportError::Send)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status { status });
        }
        let text = response.text().map_err(TransportError::Body)?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn post_body(request: &BridgeRequest) -> Option<String> {
    match (request.method, &request.body) {
        (HttpMethod::Post, Some(body)) => Some(body.encode()),
        _ => None,
    }
}

pub(crate) fn log_transport_failure(request: &BridgeRequest, err: &TransportError) {
    warn!(
        method = %request.method,
        endpoint = %request.endpoint,
        status = %err.status_text(),
        error = %err,
        "request failed; leaving page unchanged"
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionDisposition {
    Failed,
    Reloaded,
    Delivered,
}

/// Applies the action-endpoint contract: `ERROR` is shown and halts,
/// `message` is shown and handling continues, `reload` triggers `on_reload`
/// and halts, anything else hands the whole object to `on_success`.
pub fn handle_action_response<R, S>(
    outcome: RequestOutcome,
    notifier: &dyn Notifier,
    on_reload: R,
    on_success: S,
) -> ActionDisposition
where
    R: FnOnce(),
    S: FnOnce(Value),
{
    match outcome.classify() {
        ActionOutcome::Failed { message } => {
            notifier.error(&message);
            ActionDisposition::Failed
        }
        ActionOutcome::Reload { info } => {
            if let Some(info) = info {
                notifier.info(&info);
            }
            on_reload();
            ActionDisposition::Reloaded
        }
        ActionOutcome::Success { info, payload } => {
            if let Some(info) = info {
                notifier.info(&info);
            }
            on_success(payload);
            ActionDisposition::Delivered
        }
    }
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
