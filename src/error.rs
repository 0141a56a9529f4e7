//! Error types and utilities.
//!
//! This module provides the error handling infrastructure for the execution
//! pipeline. The main types are:
//!
//! - [`Error`] - The pipeline error, one variant per failing stage
//! - [`TransportError`] - The opaque failure type produced by transports
//! - [`Result`] - A specialized Result alias
//!
//! Every error surfaces to the immediate caller of an execute method; nothing
//! is retried or swallowed inside this crate. The two stages that run after
//! the network call carry the already-constructed [`Response`] inside the
//! error so callers can inspect partial state:
//!
//! ```rust
//! use reqkit::Error;
//!
//! fn inspect(err: Error) {
//!     if let Some(response) = err.response() {
//!         println!("received at {:?}", response.received_at());
//!     }
//! }
//! ```

use crate::Response;
use thiserror::Error;

/// A type-erased error, used for hook failures and transport internals.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error type surfaced by request execution.
///
/// The variants mirror the pipeline stages: merge failures
/// ([`UrlParse`](Error::UrlParse), [`QueryEncode`](Error::QueryEncode)) and
/// pre-request hook failures ([`PreHook`](Error::PreHook)) abort before any
/// network traffic, while [`Transport`](Error::Transport) and
/// [`PostHook`](Error::PostHook) happen after the call and therefore carry
/// the [`Response`] that was built for it.
#[derive(Debug, Error)]
pub enum Error {
    /// The merged request URL was not syntactically valid.
    ///
    /// Raised while substituting path parameters or re-parsing the URL
    /// template. No hooks have run and no network call was made.
    #[error("invalid request url")]
    UrlParse(#[from] http::uri::InvalidUri),

    /// The merged query parameters could not be re-encoded.
    ///
    /// Raised in the same merge phase as [`UrlParse`](Error::UrlParse).
    #[error("could not encode query parameters")]
    QueryEncode(#[from] serde_urlencoded::ser::Error),

    /// A pre-request hook returned an error.
    ///
    /// The remaining pre-request hooks are skipped and no network call is
    /// made; there is no [`Response`] to inspect.
    #[error("pre-request hook failed")]
    PreHook(#[source] BoxError),

    /// The transport call itself failed (connect, timeout, protocol error).
    ///
    /// A [`Response`] is still constructed, with its receive timestamp set
    /// and its raw container holding whatever the transport managed to fill
    /// in (usually nothing), so callers can inspect partial state via
    /// [`Error::response`].
    #[error("transport call failed")]
    Transport {
        /// The transport's failure.
        #[source]
        source: TransportError,
        /// The partially populated response.
        response: Box<Response>,
    },

    /// A post-response hook failed after a successful network call.
    ///
    /// The response is fully populated; the remaining post-response hooks
    /// were skipped.
    #[error("post-response hook failed")]
    PostHook {
        /// The hook's failure.
        #[source]
        source: BoxError,
        /// The fully populated response.
        response: Box<Response>,
    },
}

impl Error {
    /// Returns the response carried by this error, if the pipeline got far
    /// enough to construct one.
    ///
    /// Only [`Error::Transport`] and [`Error::PostHook`] carry a response.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Transport { response, .. } | Error::PostHook { response, .. } => {
                Some(response)
            }
            _ => None,
        }
    }

    /// Consumes the error, returning the carried response if there is one.
    pub fn into_response(self) -> Option<Response> {
        match self {
            Error::Transport { response, .. } | Error::PostHook { response, .. } => {
                Some(*response)
            }
            _ => None,
        }
    }
}

/// The failure type produced by [`Transport`](crate::transport::Transport)
/// implementations.
///
/// Transports wrap whatever their underlying I/O produces; this crate treats
/// it as opaque and never retries.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(#[from] BoxError);

impl TransportError {
    /// Wraps an arbitrary error as a transport failure.
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }

    /// Creates a transport failure from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }

    /// Returns a reference to the wrapped error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync) {
        self.0.as_ref()
    }
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        Self(Box::new(error))
    }
}

/// A specialized Result type for request execution.
pub type Result<T, E = Error> = core::result::Result<T, E>;
