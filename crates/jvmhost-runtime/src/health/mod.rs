//! HTTP client for the worker: readiness polling and command forwarding.
//!
//! Every call carries its own timeout, separate from the retry budget. Only
//! connection-level failures are retried; an HTTP error status means the
//! worker is up and refused the call.

mod error;
mod retry;

use std::time::Duration;

use jvmhost_core::HealthSettings;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

pub use error::ClientError;
pub use retry::{RetryPolicy, with_retry};

/// Longest error body kept in [`ClientError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Client for one worker instance.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    http: Client,
    base_url: String,
    health_path: String,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl WorkerClient {
    /// Client for a worker listening on loopback `port`.
    pub fn new(port: u16, settings: &HealthSettings) -> Result<Self, ClientError> {
        Self::with_base_url(format!("http://127.0.0.1:{port}"), settings)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        settings: &HealthSettings,
    ) -> Result<Self, ClientError> {
        // The worker is always local; never route through a system proxy
        let http = Client::builder().no_proxy().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_path: settings.path.clone(),
            request_timeout: settings.request_timeout(),
            retry: RetryPolicy::from_settings(settings),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One readiness probe. `Ok` only for a 2xx answer.
    pub async fn check_health(&self) -> Result<(), ClientError> {
        self.check_health_within(self.request_timeout).await
    }

    async fn check_health_within(&self, limit: Duration) -> Result<(), ClientError> {
        let url = format!("{}{}", self.base_url, self.health_path);
        let response = timeout(limit, self.http.get(&url).send())
            .await
            .map_err(|_| ClientError::Timeout(limit))??;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::Status {
                status: status.as_u16(),
                body: String::new(),
            })
        }
    }

    /// Poll the readiness endpoint every `interval` until it answers 2xx or
    /// `overall` elapses. The first poll is immediate.
    ///
    /// Individual failures are expected while the worker boots and are not
    /// reported; timeouts are not even logged.
    pub async fn wait_for_ready(&self, overall: Duration, interval: Duration) -> bool {
        let deadline = Instant::now() + overall;
        info!(url = %self.base_url, timeout_secs = overall.as_secs(), "Waiting for worker to be ready");

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }

            match self
                .check_health_within(self.request_timeout.min(remaining))
                .await
            {
                Ok(()) => {
                    info!(url = %self.base_url, "Worker is ready");
                    return true;
                }
                Err(ClientError::Timeout(_)) => {}
                Err(e) => debug!(error = %e, "Readiness poll failed"),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            sleep(interval.min(remaining)).await;
        }
    }

    /// Forward `command` to the worker with retry and return the raw result.
    ///
    /// A `{ "success": false, "error": ... }` body is returned as
    /// [`ClientError::Rejected`]; a `{ "success": true, "data": ... }`
    /// envelope is unwrapped to its data.
    pub async fn request(&self, command: &str, args: Value) -> Result<Value, ClientError> {
        with_retry(&self.retry, |attempt| {
            let args = args.clone();
            async move {
                debug!(command = %command, attempt = %attempt, "Sending worker command");
                self.send_once(command, args).await
            }
        })
        .await
        .and_then(unwrap_envelope)
    }

    /// [`request`](Self::request), decoding the result into `T`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Value,
    ) -> Result<T, ClientError> {
        let value = self.request(command, args).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_once(&self, command: &str, args: Value) -> Result<Value, ClientError> {
        let url = format!("{}/api/{command}", self.base_url);
        let body = json!({ "command": command, "args": args });
        let limit = self.request_timeout;

        timeout(limit, async {
            let response = self.http.post(&url).json(&body).send().await?;
            let status = response.status();
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ClientError::from_response_error(&e))?;

            if !status.is_success() {
                let text = String::from_utf8_lossy(&bytes);
                return Err(ClientError::Status {
                    status: status.as_u16(),
                    body: text.chars().take(MAX_ERROR_BODY).collect(),
                });
            }

            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
        })
        .await
        .map_err(|_| ClientError::Timeout(limit))?
    }
}

/// Interpret the generic `{ success, error?, data? }` envelope.
fn unwrap_envelope(value: Value) -> Result<Value, ClientError> {
    let Some(object) = value.as_object() else {
        return Ok(value);
    };

    match object.get("success").and_then(Value::as_bool) {
        Some(false) => {
            let message = object
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_string();
            Err(ClientError::Rejected(message))
        }
        Some(true) if object.contains_key("data") => {
            Ok(object.get("data").cloned().unwrap_or(Value::Null))
        }
        _ => Ok(value),
    }
}
