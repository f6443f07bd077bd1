//! Client error types
//!
//! Callers can tell apart a query that was malformed before sending, a
//! request the service rejected, and a request the network never delivered.

use super::transport::TransportError;
use crate::query::QueryError;
use thiserror::Error;

/// Errors that can occur when talking to the Cube.js API
#[derive(Error, Debug)]
pub enum ClientError {
    /// The query failed validation before anything was sent
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    /// A single attempt failed at the network layer (retryable)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Every attempt failed at the network layer
    #[error("Request failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The service answered with a non-success status
    #[error("API error {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not valid JSON of the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Signing the bearer token failed
    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The token expiry does not fit in a timestamp
    #[error("Token lifetime of {ttl_secs}s is out of range")]
    TokenLifetime { ttl_secs: i64 },
}

impl ClientError {
    /// The network never delivered the request
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RetriesExhausted { .. })
    }

    /// The service rejected the request
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// The query was malformed before sending
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// HTTP status, when the service answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::TransportErrorKind;

    #[test]
    fn test_error_display() {
        let err = ClientError::Http {
            status: 400,
            body: "{\"error\":\"Cube not found\"}".into(),
        };
        assert_eq!(err.to_string(), "API error 400: {\"error\":\"Cube not found\"}");
        assert_eq!(err.status(), Some(400));
        assert!(err.is_http());
        assert!(!err.is_transport());

        let err = ClientError::RetriesExhausted {
            attempts: 8,
            source: TransportError::new(TransportErrorKind::Connect, "connection refused"),
        };
        assert_eq!(
            err.to_string(),
            "Request failed after 8 attempts: Connection failed: connection refused"
        );
        assert!(err.is_transport());
    }

    #[test]
    fn test_query_error_conversion() {
        let err: ClientError = QueryError::Validation("bad range".into()).into();
        assert!(err.is_validation());
        assert_eq!(err.status(), None);
    }
}
