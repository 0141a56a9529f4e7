//! Hook traits, the guarded hook registry, and the request merger.
//!
//! A hook is a synchronous function invoked at a fixed pipeline stage. It
//! may inspect or mutate the in-flight request (pre-request hooks) or the
//! response (post-response hooks), and aborts the pipeline by returning an
//! error. Only the transport call itself suspends; hooks never block.
//!
//! Pre-request hooks are partitioned into *user-defined* and *built-in*
//! lists. For one execution, every user-defined hook runs first (in
//! registration order), then every built-in hook (in registration order).
//! The first error aborts before the network call.
//!
//! ```rust
//! # use reqkit::{Client, transport::{Context, OutgoingRequest, RawResponse, Transport}};
//! # use reqkit::TransportError;
//! # struct Noop;
//! # impl Transport for Noop {
//! #     async fn perform(&self, _: &Context, _: &mut OutgoingRequest, _: &mut RawResponse)
//! #         -> Result<(), TransportError> { Ok(()) }
//! # }
//! let client = Client::new(Noop);
//! client.on_before_request(|_client, request| {
//!     request.headers_mut().insert(
//!         http::header::USER_AGENT,
//!         http::HeaderValue::from_static("reqkit/0.1"),
//!     );
//!     Ok(())
//! });
//! ```
//!
//! This module also hosts the merger: the pure functions that combine
//! client-level defaults with request-level state into the final URL, header
//! set, cookie list, and payload. Request-level values always take
//! precedence per key; value lists are never merged element-by-element.

use crate::error::{BoxError, Error};
use crate::request::Request;
use crate::transport::Payload;
use crate::{Client, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Uri};
use parking_lot::{RwLock, RwLockReadGuard};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::mem::take;

/// A pre-request hook.
///
/// Implemented for every `Fn(&Client, &mut Request<'_>) -> Result<(),
/// BoxError> + Send + Sync`, so plain closures and free functions register
/// directly.
pub trait RequestHook: Send + Sync {
    /// Inspects or mutates the in-flight request. Returning an error aborts
    /// the pipeline before the network call.
    fn call(&self, client: &Client, request: &mut Request<'_>) -> Result<(), BoxError>;
}

impl<F> RequestHook for F
where
    F: Fn(&Client, &mut Request<'_>) -> Result<(), BoxError> + Send + Sync,
{
    fn call(&self, client: &Client, request: &mut Request<'_>) -> Result<(), BoxError> {
        self(client, request)
    }
}

/// A post-response hook.
///
/// Implemented for every `Fn(&Client, &mut Response) -> Result<(), BoxError>
/// + Send + Sync`. Runs only after a successful network call; the first
/// error stops the remaining hooks.
pub trait ResponseHook: Send + Sync {
    /// Inspects or mutates the freshly built response.
    fn call(&self, client: &Client, response: &mut Response) -> Result<(), BoxError>;
}

impl<F> ResponseHook for F
where
    F: Fn(&Client, &mut Response) -> Result<(), BoxError> + Send + Sync,
{
    fn call(&self, client: &Client, response: &mut Response) -> Result<(), BoxError> {
        self(client, response)
    }
}

/// Ordered hook lists, each behind its own reader-writer lock.
///
/// Registration takes a write lock; execution takes read locks for the whole
/// hook-running phase so one pipeline run always observes a consistent
/// snapshot, never a torn list. Many executions may read concurrently.
pub(crate) struct HookRegistry {
    user_before: RwLock<Vec<Box<dyn RequestHook>>>,
    builtin_before: RwLock<Vec<Box<dyn RequestHook>>>,
    after: RwLock<Vec<Box<dyn ResponseHook>>>,
}

impl HookRegistry {
    pub(crate) fn new() -> Self {
        Self {
            user_before: RwLock::new(Vec::new()),
            builtin_before: RwLock::new(Vec::new()),
            after: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn register_user_before(&self, hook: Box<dyn RequestHook>) {
        self.user_before.write().push(hook);
    }

    pub(crate) fn register_builtin_before(&self, hook: Box<dyn RequestHook>) {
        self.builtin_before.write().push(hook);
    }

    pub(crate) fn register_after(&self, hook: Box<dyn ResponseHook>) {
        self.after.write().push(hook);
    }

    pub(crate) fn user_before(&self) -> RwLockReadGuard<'_, Vec<Box<dyn RequestHook>>> {
        self.user_before.read()
    }

    pub(crate) fn builtin_before(&self) -> RwLockReadGuard<'_, Vec<Box<dyn RequestHook>>> {
        self.builtin_before.read()
    }

    pub(crate) fn after(&self) -> RwLockReadGuard<'_, Vec<Box<dyn ResponseHook>>> {
        self.after.read()
    }
}

// Path-segment escaping set, everything but unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Resolves the final request URL for one execution.
///
/// Path parameters: a combined map seeded from the request's params, then
/// any client param whose key is not already present (request wins). Each
/// value is percent-escaped and substituted for its `{key}` token; a token
/// with no matching key is left verbatim.
///
/// Query parameters: client-level keys absent at request level copy their
/// whole value list in, then the merged set is re-encoded and appended to a
/// non-empty existing query with `&`, or set directly.
pub(crate) fn parse_request_url(client: &Client, request: &mut Request<'_>) -> Result<(), Error> {
    let mut path_params = take(&mut request.path_params);
    path_params.merge_defaults(client.path_params());
    for (key, values) in path_params.iter() {
        let Some(value) = values.first() else {
            continue;
        };
        let escaped = utf8_percent_encode(value, PATH_SEGMENT).to_string();
        request.url = request.url.replacen(&format!("{{{key}}}"), &escaped, 1);
    }
    request.path_params = path_params;

    let uri: Uri = request.url.parse()?;

    request.query_params.merge_defaults(client.query_params());
    if request.query_params.is_empty() {
        request.outgoing_mut().set_uri(uri);
        return Ok(());
    }

    let pairs: Vec<(&str, &str)> = request.query_params.pairs().collect();
    let encoded = serde_urlencoded::to_string(pairs)?;
    let query = match uri.query() {
        Some(existing) if !existing.trim().is_empty() => format!("{existing}&{encoded}"),
        _ => encoded,
    };

    let mut url = String::new();
    if let Some(scheme) = uri.scheme_str() {
        url.push_str(scheme);
        url.push_str("://");
    }
    if let Some(authority) = uri.authority() {
        url.push_str(authority.as_str());
    }
    url.push_str(uri.path());
    url.push('?');
    url.push_str(&query);

    let merged: Uri = url.parse()?;
    request.url = url;
    request.outgoing_mut().set_uri(merged);
    Ok(())
}

/// Merges client-level default headers into the request's header set.
///
/// A key already set at request level wins with its entire value list; an
/// absent key inherits every client-level value verbatim.
pub(crate) fn parse_request_header(client: &Client, request: &mut Request<'_>) {
    for key in client.headers().keys() {
        if request.headers().contains_key(key) {
            continue;
        }
        for value in client.headers().get_all(key) {
            request.headers_mut().append(key.clone(), value.clone());
        }
    }
}

/// Applies client-level default cookies the request did not already set.
///
/// Precedence is per cookie name: a request-level cookie is never
/// overwritten.
pub(crate) fn parse_request_cookies(client: &Client, request: &mut Request<'_>) {
    for cookie in client.cookies() {
        if !request.outgoing().has_cookie(cookie.name()) {
            request.outgoing_mut().set_cookie(cookie.clone());
        }
    }
}

/// Built-in pre-request hook resolving the payload and its content type.
///
/// A request carries at most one of raw body, form data, or multipart files.
/// Registered files force `multipart/form-data`; otherwise present form data
/// forces `application/x-www-form-urlencoded`. Both overrides win over any
/// explicitly set content-type header.
pub(crate) fn resolve_request_body(
    _client: &Client,
    request: &mut Request<'_>,
) -> Result<(), BoxError> {
    let payload = if !request.files.is_empty() {
        request.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data"),
        );
        Payload::Multipart {
            fields: take(&mut request.form_data),
            files: take(&mut request.files),
        }
    } else if !request.form_data.is_empty() {
        request.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        Payload::Form(take(&mut request.form_data))
    } else {
        Payload::Full(take(&mut request.body))
    };

    match payload {
        Payload::Full(body) => request.outgoing_mut().set_body(body),
        Payload::Form(fields) => request.outgoing_mut().set_form_data(fields),
        Payload::Multipart { fields, files } => {
            request.outgoing_mut().set_multipart(fields, files)
        }
    }
    Ok(())
}

/// Built-in post-response hook decoding the body into the bound
/// destinations.
///
/// Decodes only when the request registered a binding: the result binding on
/// success statuses, the error binding on error statuses. Statuses in the
/// 300–399 gap decode nothing.
pub(crate) fn decode_response(_client: &Client, response: &mut Response) -> Result<(), BoxError> {
    response.run_bindings().map_err(Into::into)
}
