//! Error types for the mood diary client
//!
//! All errors use thiserror for structured error handling.
//! `ClassifiedError` is the closed set every HTTP failure is normalized to;
//! `AppError` wraps it together with the local failure modes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A transport or server failure, normalized for callers.
///
/// Serializes as `{"type":"NETWORK_ERROR"}` or
/// `{"type":"HTTP_ERROR","status":422,"data":{...}}`.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassifiedError {
    /// No response reached the client (connect failure, DNS, timeout).
    #[error("Network error: server did not respond")]
    NetworkError,

    /// A response arrived with a non-success status.
    #[error("HTTP error: status {status}")]
    HttpError {
        status: u16,
        data: serde_json::Value,
    },
}

impl ClassifiedError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClassifiedError::NetworkError => None,
            ClassifiedError::HttpError { status, .. } => Some(*status),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Request failed: {0}")]
    Request(#[from] ClassifiedError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// The classified transport failure, if this error came from the request client.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            AppError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
