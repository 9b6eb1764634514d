//! Failure classification
//!
//! Pure functions: a raw failure goes in, a `ClassifiedError` comes out, and
//! `describe` turns that into the notice the user sees. The backend reports
//! errors as `{ "detail": string | [{ "msg": string, ... }] }`.

use crate::error::ClassifiedError;
use crate::http::notify::Notice;
use serde_json::Value;

pub const NETWORK_MESSAGE: &str =
    "Network error: unable to reach the server. Check your connection or try again later.";
pub const BAD_REQUEST_MESSAGE: &str = "Invalid request parameters. Please check and try again.";
pub const BAD_FORMAT_MESSAGE: &str = "The submitted data is not in a valid format.";
pub const SERVER_ERROR_MESSAGE: &str =
    "The server encountered an internal error. Please contact the administrator or try again later.";

/// What the transport observed before classification
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// The request never produced a response (connect error, timeout)
    NoResponse,
    /// A response arrived with a non-success status
    Status { status: u16, body: Value },
}

/// Normalize a raw failure
pub fn classify(raw: RawFailure) -> ClassifiedError {
    match raw {
        RawFailure::NoResponse => ClassifiedError::NetworkError,
        RawFailure::Status { status, body } => ClassifiedError::HttpError { status, data: body },
    }
}

/// Notice shown for a classified failure
pub fn describe(error: &ClassifiedError) -> Notice {
    Notice::error(message_for(error))
}

fn message_for(error: &ClassifiedError) -> String {
    let (status, data) = match error {
        ClassifiedError::NetworkError => return NETWORK_MESSAGE.to_string(),
        ClassifiedError::HttpError { status, data } => (*status, data),
    };

    match status {
        400 => data
            .get("detail")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(BAD_REQUEST_MESSAGE)
            .to_string(),
        422 => first_validation_message(data)
            .unwrap_or(BAD_FORMAT_MESSAGE)
            .to_string(),
        500 => SERVER_ERROR_MESSAGE.to_string(),
        other => format!("Unexpected error, status code: {}", other),
    }
}

// `detail` must be an array; only its first entry is consulted
fn first_validation_message(data: &Value) -> Option<&str> {
    data.get("detail")?
        .as_array()?
        .first()?
        .get("msg")?
        .as_str()
        .filter(|s| !s.is_empty())
}
