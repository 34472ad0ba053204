//! Structured error types for API operations.
//!
//! These are designed to be displayable in both CLI and TUI contexts.

use thiserror::Error;

/// Errors produced by the client layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication failed — check DEVLAB_API_KEY")]
    AuthenticationFailed,

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("hard stop: API has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("log stream closed: {0}")]
    StreamClosed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl ApiError {
    /// Rewrite a bare HTTP 404 into a typed not-found for the given resource.
    pub fn or_not_found(self, kind: &'static str, id: &str) -> Self {
        match self {
            ApiError::Api { status: 404, .. } => ApiError::NotFound {
                kind,
                id: id.to_string(),
            },
            other => other,
        }
    }

    /// True for errors caused by the network rather than the request itself.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::NetworkUnreachable(_) | ApiError::RateLimited { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_rewrite_only_touches_404() {
        let e = ApiError::Api {
            status: 404,
            message: "missing".into(),
        };
        match e.or_not_found("devbox", "dbx_1") {
            ApiError::NotFound { kind, id } => {
                assert_eq!(kind, "devbox");
                assert_eq!(id, "dbx_1");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }

        let e = ApiError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(matches!(
            e.or_not_found("devbox", "dbx_1"),
            ApiError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn transient_classification() {
        assert!(ApiError::NetworkUnreachable("dns".into()).is_transient());
        assert!(ApiError::RateLimited {
            retry_after_secs: 5
        }
        .is_transient());
        assert!(!ApiError::AuthenticationFailed.is_transient());
    }
}
