//! Error types for the HTTP client wrapper.
//!
//! # Design
//! Four failure kinds reach the caller and none of them is retried here.
//! Causes coming from outside the crate (a failing request builder, a
//! decoder, the transport) are kept as boxed errors so callers can still
//! downcast to the original type.

use thiserror::Error;

/// Type-erased error used for causes owned by a caller or a transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `HttpClient` send methods.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request-producing operation failed; nothing was sent.
    #[error("failed to build request: {0}")]
    RequestBuild(#[source] BoxError),

    /// The transport answered with something that is not an HTTP response.
    #[error("response is not an HTTP response")]
    BadResponseType,

    /// The response body could not be decoded into the requested type.
    #[error("failed to decode response: {0}")]
    BadResponse(#[source] BoxError),

    /// The transport failed. The original error is carried unchanged.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
}

impl HttpError {
    /// The boxed cause, if this variant carries one.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            HttpError::RequestBuild(e) | HttpError::BadResponse(e) | HttpError::Transport(e) => Some(&**e),
            HttpError::BadResponseType => None,
        }
    }

    /// Downcast the carried cause to a concrete error type.
    pub fn downcast_cause<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.cause().and_then(|e| e.downcast_ref::<E>())
    }
}
