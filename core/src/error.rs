//! Error types for the VergeOS reconciliation client.
//!
//! # Design
//! Failures are split by who said no. `TransportError` means the request
//! never completed; `ApiError` means the server answered with a non-2xx
//! status; `Decode` means the server answered 2xx but the payload is not the
//! expected shape. A 404 on read is not an error at all: the reconciler turns
//! it into an `Absent` transition.

use thiserror::Error;

use crate::config::ConfigError;

/// The request could not be built, sent, or its body read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("request to {endpoint} failed: {message}")]
    Send { endpoint: String, message: String },

    #[error("reading response body from {endpoint} failed: {message}")]
    BodyRead { endpoint: String, message: String },
}

/// A non-2xx response from the remote API.
///
/// `message` is the envelope's `err` field when the body decodes as an
/// envelope with a non-empty error, otherwise the raw body text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("[ API Error {status} ] @ {endpoint} - {message}")]
pub struct ApiError {
    pub message: String,
    pub status: u16,
    pub endpoint: String,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// All errors surfaced by the client, reconciler, and collection queries.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server accepted the request but the body is unreadable.
    #[error("decoding response from {endpoint} failed: {message}")]
    Decode { endpoint: String, message: String },

    /// The request payload could not be serialized to JSON.
    #[error("encoding request body failed: {0}")]
    Encode(String),

    #[error("invalid value for {kind}.{field}: {message}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        message: String,
    },

    #[error("cannot {operation} {kind} while {state}")]
    InvalidTransition {
        kind: &'static str,
        state: String,
        operation: &'static str,
    },

    /// A key that cannot be addressed as a single path segment.
    #[error("invalid {kind} key {key:?}")]
    InvalidKey { kind: &'static str, key: String },

    /// A 2xx status other than the one the operation requires.
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// The API error behind this failure, if the server rejected the request.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_carries_status_endpoint_and_message() {
        let err = ApiError {
            message: "name already exists".into(),
            status: 409,
            endpoint: "api/v4/vms".into(),
        };
        assert_eq!(
            err.to_string(),
            "[ API Error 409 ] @ api/v4/vms - name already exists"
        );
    }

    #[test]
    fn error_display() {
        let err = Error::UnexpectedStatus {
            status: 202,
            endpoint: "api/v4/vms/3".into(),
        };
        assert_eq!(err.to_string(), "unexpected status 202 from api/v4/vms/3");

        let err = Error::InvalidField {
            kind: "vm",
            field: "os_family",
            message: "expected one of linux, windows".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for vm.os_family: expected one of linux, windows"
        );
    }

    #[test]
    fn api_accessor_only_matches_api_errors() {
        let err = Error::from(ApiError {
            message: "gone".into(),
            status: 404,
            endpoint: "api/v4/users/9".into(),
        });
        assert!(err.api().is_some_and(ApiError::is_not_found));

        let err = Error::Encode("bad".into());
        assert!(err.api().is_none());
    }
}
