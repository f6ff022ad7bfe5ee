//! Errors raised by the remote project API.

use thiserror::Error;

/// Failure of a single remote call.
///
/// Every variant names the operation and the project/file it targeted so a
/// log line is enough to tell which request failed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("{operation} {target} failed with HTTP {status}{}", format_body(.body))]
    Status {
        operation: &'static str,
        target: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response.
    #[error("{operation} {target} request failed: {source}")]
    Network {
        operation: &'static str,
        target: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not match the expected shape.
    #[error("{operation} {target} returned an unexpected body: {message}")]
    Decode {
        operation: &'static str,
        target: String,
        message: String,
    },

    /// Writing a downloaded body to disk failed.
    #[error("{operation} {target} could not be written: {source}")]
    Io {
        operation: &'static str,
        target: String,
        #[source]
        source: std::io::Error,
    },
}

fn format_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl ApiError {
    /// HTTP status of the failed call, if the service answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for remote calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_includes_body() {
        let err = ApiError::Status {
            operation: "updateFileTranslation",
            target: "project 9588 file 7".into(),
            status: 400,
            body: "{\"message\":\"bad file\"}\n".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("updateFileTranslation project 9588 file 7"));
        assert!(msg.contains("HTTP 400"));
        assert!(msg.ends_with("{\"message\":\"bad file\"}"));
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_status_error_without_body() {
        let err = ApiError::Status {
            operation: "listFiles",
            target: "project 1".into(),
            status: 503,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "listFiles project 1 failed with HTTP 503");
    }
}
