//! The read-only response view.
//!
//! A [`Response`] is created once per execution, after the transport call
//! returns. It owns the raw response container the transport filled in, the
//! receive timestamp, and the typed decode slots carried over from the
//! consuming request. Once the pipeline hands it to the caller it is
//! effectively immutable.
//!
//! Status classification is deliberately narrow:
//! [`is_success`](Response::is_success) covers 200–299,
//! [`is_error`](Response::is_error) covers 400 and above, and statuses in
//! the 300–399 gap are *neither*: redirects are not silently reclassified.

use crate::request::Binding;
use crate::transport::RawResponse;
use bytes::Bytes;
use cookie::Cookie;
use http::{HeaderMap, StatusCode};
use std::any::Any;
use std::fmt::{self, Debug};
use std::time::Instant;

/// The outcome of one executed request.
///
/// Accessors never panic on a missing raw response: a failed transport call
/// still produces a `Response` (carried inside
/// [`Error::Transport`](crate::Error::Transport)) whose status is `None`
/// and whose body is empty.
pub struct Response {
    raw: RawResponse,
    received_at: Instant,
    result_binding: Option<Binding>,
    error_binding: Option<Binding>,
    result: Option<Box<dyn Any + Send + Sync>>,
    error: Option<Box<dyn Any + Send + Sync>>,
}

impl Response {
    pub(crate) fn new(
        raw: RawResponse,
        received_at: Instant,
        result_binding: Option<Binding>,
        error_binding: Option<Binding>,
    ) -> Self {
        Self {
            raw,
            received_at,
            result_binding,
            error_binding,
            result: None,
            error: None,
        }
    }

    /// The status code, or `None` when the transport never produced one.
    pub fn status(&self) -> Option<StatusCode> {
        self.raw.status()
    }

    /// The raw body bytes. Empty when the call failed before a body arrived.
    pub fn body(&self) -> &Bytes {
        self.raw.body()
    }

    /// The body decoded as UTF-8 (lossily) with surrounding whitespace
    /// trimmed.
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(self.raw.body()).trim().to_owned()
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.raw.headers()
    }

    /// The cookies set by the response, parsed from its `Set-Cookie`
    /// headers. Unparseable values are skipped.
    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        self.raw
            .headers()
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_owned()).ok())
            .collect()
    }

    /// The instant the transport call returned, set whether it succeeded or
    /// failed.
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// `true` exactly for statuses 200–299.
    pub fn is_success(&self) -> bool {
        matches!(self.status(), Some(status) if status.as_u16() >= 200 && status.as_u16() < 300)
    }

    /// `true` exactly for statuses 400 and above.
    ///
    /// Together with [`is_success`](Response::is_success) this leaves
    /// 300–399 unclassified on purpose.
    pub fn is_error(&self) -> bool {
        matches!(self.status(), Some(status) if status.as_u16() > 399)
    }

    /// The decoded success destination, if the request bound one with
    /// [`bind_result`](crate::Request::bind_result) and the response status
    /// was a success.
    pub fn result<T: 'static>(&self) -> Option<&T> {
        self.result.as_ref().and_then(|value| value.downcast_ref())
    }

    /// The decoded error destination, if the request bound one with
    /// [`bind_error`](crate::Request::bind_error) and the response status
    /// was an error.
    pub fn error_value<T: 'static>(&self) -> Option<&T> {
        self.error.as_ref().and_then(|value| value.downcast_ref())
    }

    /// The raw container the transport filled in.
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    /// Runs the decode bindings against the body, populating the matching
    /// slot. Decodes only when a destination is present for the status
    /// class.
    pub(crate) fn run_bindings(&mut self) -> Result<(), serde_json::Error> {
        if self.is_success() {
            if let Some(binding) = &self.result_binding {
                self.result = Some(binding.run(self.raw.body())?);
            }
        } else if self.is_error() {
            if let Some(binding) = &self.error_binding {
                self.error = Some(binding.run(self.raw.body())?);
            }
        }
        Ok(())
    }
}

impl Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status())
            .field("body_len", &self.body().len())
            .field("received_at", &self.received_at)
            .finish_non_exhaustive()
    }
}
