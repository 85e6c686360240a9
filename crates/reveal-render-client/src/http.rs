//! Shared HTTP plumbing for the service clients.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use reveal_models::run_until_cancelled;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{RenderError, RenderResult};

/// Configuration for one remote service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the service
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Optional bearer token
    pub api_key: Option<String>,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }

    /// Create config from `{PREFIX}_URL`, `{PREFIX}_TIMEOUT` and `{PREFIX}_API_KEY`.
    pub fn from_env_prefixed(prefix: &str, default_url: &str) -> Self {
        Self {
            base_url: std::env::var(format!("{}_URL", prefix))
                .unwrap_or_else(|_| default_url.to_string()),
            timeout: Duration::from_secs(
                std::env::var(format!("{}_TIMEOUT", prefix))
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            api_key: std::env::var(format!("{}_API_KEY", prefix))
                .ok()
                .filter(|k| !k.is_empty()),
        }
    }

    /// Check that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> RenderResult<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| RenderError::config_error(format!("{}: {}", self.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(RenderError::config_error(format!(
                "unsupported scheme '{}' in {}",
                other, self.base_url
            ))),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// JSON-over-HTTP transport that races every request against a token.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    http: Client,
    config: ServiceConfig,
}

impl HttpTransport {
    pub(crate) fn new(config: ServiceConfig) -> RenderResult<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RenderError::Network)?;
        Ok(Self { http, config })
    }

    pub(crate) fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.http
    }

    pub(crate) async fn get_json<R>(&self, path: &str, token: &CancellationToken) -> RenderResult<R>
    where
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!("GET {}", url);
        let request = self.authorize(self.http.get(&url));
        run_until_cancelled(token, Self::execute(request)).await?
    }

    pub(crate) async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        token: &CancellationToken,
    ) -> RenderResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        debug!("POST {}", url);
        let request = self.authorize(self.http.post(&url).json(body));
        run_until_cancelled(token, Self::execute(request)).await?
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn execute<R: DeserializeOwned>(request: RequestBuilder) -> RenderResult<R> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::from_http_status(status, &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            RenderError::invalid_response(format!(
                "{} (body: {})",
                e,
                String::from_utf8_lossy(&bytes)
            ))
        })
    }
}
