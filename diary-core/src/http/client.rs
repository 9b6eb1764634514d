//! Shared request client
//!
//! One explicitly constructed transport for every call the diary makes.
//! Timeout and notifier are fixed at construction. Every failure passes
//! through `reject`, which classifies it, dispatches exactly one notice and
//! hands the classified value back to the caller for local cleanup.

use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::http::classify::{classify, describe, RawFailure};
use crate::http::notify::Notifier;
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    base: Url,
    notifier: Arc<dyn Notifier>,
}

impl RequestClient {
    pub fn new(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("mood-diary/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        let base = config.base()?;
        tracing::info!("Request client ready for {} (timeout {:?})", base, config.timeout);

        Ok(Self {
            http,
            base,
            notifier,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for an API path, keeping any prefix of the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Resolve a URL returned by the server (e.g. `/uploads/a.png`) against the backend
    pub fn resolve_url(&self, url: &str) -> Result<String> {
        self.base
            .join(url)
            .map(String::from)
            .map_err(|e| AppError::Decode(format!("Invalid asset URL '{}': {}", url, e)))
    }

    /// Notify without a transport failure (client-side rejections)
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!("POST {}", url);

        let response = self.execute(self.http.post(url).json(body)).await?;
        self.decode(response).await
    }

    pub async fn post_multipart<T>(&self, path: &str, form: Form) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        tracing::debug!("POST multipart {}", url);

        let response = self.execute(self.http.post(url).multipart(form)).await?;
        self.decode(response).await
    }

    /// Send and intercept; only success statuses come back as `Ok`
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let raw = match request.send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::warn!("Server answered {} for {}", status, response.url());
                RawFailure::Status {
                    status,
                    body: read_error_body(response).await,
                }
            }
            Err(e) => {
                tracing::warn!("Request failed without a response: {}", e);
                RawFailure::NoResponse
            }
        };

        Err(self.reject(raw))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                // Body cut off (usually the timeout); nothing usable arrived
                tracing::warn!("Failed to read response body: {}", e);
                return Err(self.reject(RawFailure::NoResponse));
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!("Failed to decode response body: {}", e);
            AppError::Decode(e.to_string())
        })
    }

    fn reject(&self, raw: RawFailure) -> AppError {
        let classified = classify(raw);
        self.notifier.notify(&describe(&classified));
        AppError::Request(classified)
    }
}

async fn read_error_body(response: Response) -> serde_json::Value {
    match response.bytes().await {
        Ok(bytes) if bytes.is_empty() => serde_json::Value::Null,
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }),
        Err(e) => {
            tracing::debug!("Error body unreadable: {}", e);
            serde_json::Value::Null
        }
    }
}
