//! Client configuration constants
//!
//! Central location for endpoint paths, timing constants and resource
//! limits used throughout the client. `ClientConfig` bundles them and is
//! fixed once the request client has been constructed.

use crate::error::{AppError, Result};
use reqwest::Url;
use std::time::Duration;

// ===== Backend =====

/// Backend location used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Sentiment analysis endpoint
pub const ANALYZE_PATH: &str = "/analyze-diary";

/// Multipart upload endpoint
pub const UPLOAD_PATH: &str = "/api/v1/upload";

/// Name of the multipart field carrying the file
pub const UPLOAD_FIELD: &str = "file";

// ===== Timing =====

/// Upper bound for any single request, including uploads
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Idle time after the last edit before analysis fires
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(1500);

// ===== Limits =====

/// Minimum trimmed character count before content is analyzed
pub const MIN_ANALYSIS_CHARS: usize = 10;

/// Maximum upload size (100 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Chunk size for streamed upload bodies; progress advances per chunk
pub const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Runtime configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub debounce_delay: Duration,
    pub min_analysis_chars: usize,
    pub max_upload_bytes: u64,
    pub upload_chunk_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: REQUEST_TIMEOUT,
            debounce_delay: DEBOUNCE_DELAY,
            min_analysis_chars: MIN_ANALYSIS_CHARS,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            upload_chunk_bytes: UPLOAD_CHUNK_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Parse the base URL. A trailing slash is added so relative joins keep any path prefix.
    pub fn base(&self) -> Result<Url> {
        let raw = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };

        Url::parse(&raw)
            .map_err(|e| AppError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))
    }

    /// Reject values the client cannot operate with
    pub fn validate(&self) -> Result<()> {
        self.base()?;

        if self.timeout.is_zero() {
            return Err(AppError::Config("Request timeout must be greater than 0".to_string()));
        }

        if self.max_upload_bytes == 0 {
            return Err(AppError::Config("Upload limit must be greater than 0".to_string()));
        }

        if self.upload_chunk_bytes == 0 {
            return Err(AppError::Config("Upload chunk size must be greater than 0".to_string()));
        }

        Ok(())
    }
}
