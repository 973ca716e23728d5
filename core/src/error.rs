//! Error types for the drug API client.
//!
//! # Design
//! Transport failures (no HTTP response at all) and protocol failures (an HTTP
//! response outside 2xx) are kept apart. `Connectivity` means the backend
//! could not be reached. `NotFound` is split out of the protocol errors
//! because callers treat it as "already gone". Nothing here retries on its
//! own; `is_retryable` only tells a caller whether a manual retry makes sense.

use std::collections::BTreeMap;
use std::time::Duration;

/// Field-keyed validation messages supplied by the backend.
pub type FieldErrors = BTreeMap<String, String>;

/// Errors surfaced by `DrugClient` operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The backend host could not be reached.
    #[error("Unable to connect to the API server. Please ensure the backend is running.")]
    Connectivity { url: String, reason: String },

    /// The request was cancelled after the configured timeout.
    #[error("request to {url} timed out after {}ms", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    /// The backend answered 404.
    #[error("{message}")]
    NotFound { message: String },

    /// Any other non-2xx answer.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        field_errors: Option<FieldErrors>,
    },

    /// Transport failure that is neither unreachable nor a timeout.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Connectivity { .. })
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Http {
                field_errors: Some(errors),
                ..
            } if !errors.is_empty() => Some(errors),
            _ => None,
        }
    }

    /// Whether re-issuing the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Connectivity { .. } | ApiError::Timeout { .. } => true,
            ApiError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Failure reported by a `Transport` before any HTTP response was received.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub(crate) fn into_api_error(self, url: &str) -> ApiError {
        match self {
            TransportError::Unreachable(reason) => ApiError::Connectivity {
                url: url.to_string(),
                reason,
            },
            TransportError::Timeout(timeout) => ApiError::Timeout {
                url: url.to_string(),
                timeout,
            },
            TransportError::Other(msg) => ApiError::Transport(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ApiError {
        ApiError::Http {
            status,
            message: format!("HTTP {status}"),
            field_errors: None,
        }
    }

    #[test]
    fn retry_policy_follows_error_class() {
        let connectivity = TransportError::Unreachable("refused".into()).into_api_error("http://x");
        assert!(connectivity.is_retryable());
        assert!(http(503).is_retryable());
        assert!(!http(422).is_retryable());
        assert!(!ApiError::NotFound { message: "gone".into() }.is_retryable());
    }

    #[test]
    fn connectivity_message_is_human_readable() {
        let err = TransportError::Unreachable("refused".into()).into_api_error("http://x");
        assert_eq!(
            err.to_string(),
            "Unable to connect to the API server. Please ensure the backend is running."
        );
    }

    #[test]
    fn empty_field_error_map_is_ignored() {
        let err = ApiError::Http {
            status: 422,
            message: "bad".into(),
            field_errors: Some(FieldErrors::new()),
        };
        assert!(err.field_errors().is_none());
        assert_eq!(err.status(), Some(422));
    }
}
