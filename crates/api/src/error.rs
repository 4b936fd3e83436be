//! Error types for the remote API layer.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by `QuizApi` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("{route} failed with status {status}")]
    Status {
        route: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{route} was rejected by the server (code {code}): {message}")]
    Rejected {
        route: &'static str,
        code: u16,
        message: String,
    },

    #[error("{route} response did not match the expected shape")]
    Decode {
        route: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("login succeeded but the server issued no session cookie")]
    MissingCredential,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status of a non-2xx reply, if that is what failed.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

/// Errors raised while building an `ApiConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid base url {raw:?}")]
    InvalidBaseUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base url must use http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid timeout {0:?}, expected whole seconds > 0")]
    InvalidTimeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_exposed_for_non_success_replies() {
        let err = ApiError::Status {
            route: "GET /scores",
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "GET /scores failed with status 401 Unauthorized");
        assert_eq!(ApiError::MissingCredential.status(), None);
    }
}
