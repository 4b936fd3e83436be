//! Shared error types for the services crate.

use thiserror::Error;

use quiz_api::ApiError;

/// Errors emitted by `ClientStore` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("user login required")]
    LoginRequired,
    #[error("no quiz is in progress")]
    NoActiveQuiz,
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The change was accepted by the server but the follow-up refetch failed,
    /// so the local list is stale.
    #[error("change applied but refetch failed: {0}")]
    Resync(#[source] Box<StoreError>),
}

impl StoreError {
    /// The API failure at the root of this error, if any.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::Resync(inner) => inner.api_error(),
            Self::LoginRequired | Self::NoActiveQuiz => None,
        }
    }
}
