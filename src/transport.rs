//! The transport capability and the wire-facing request/response containers.
//!
//! This crate shapes a logical request; the actual network I/O (dialing,
//! TLS, keep-alive, retries, protocol framing) is performed by a
//! [`Transport`] implementation supplied to
//! [`Client::new`](crate::Client::new). The pipeline hands the transport a
//! finalized [`OutgoingRequest`] and a fresh [`RawResponse`] container to
//! fill, plus the caller's [`Context`] passed through unmodified.
//!
//! # Implementing a transport
//!
//! ```rust
//! use reqkit::transport::{Context, OutgoingRequest, RawResponse, Transport};
//! use reqkit::TransportError;
//! use http::StatusCode;
//!
//! struct Loopback;
//!
//! impl Transport for Loopback {
//!     async fn perform(
//!         &self,
//!         _cx: &Context,
//!         _request: &mut OutgoingRequest,
//!         response: &mut RawResponse,
//!     ) -> Result<(), TransportError> {
//!         response.set_status(StatusCode::OK);
//!         response.set_body("hello");
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::TransportError;
use crate::params::Params;
use crate::request::File;
use crate::Body;
use bytes::Bytes;
use cookie::Cookie;
use http::{Extensions, HeaderMap, Method, StatusCode, Uri};
use std::any::type_name;
use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// The caller-supplied cancellation/deadline carrier.
///
/// The pipeline threads it into the transport call unmodified; this crate
/// applies no timeout logic of its own. Cancellation itself follows the
/// usual async rule: dropping the execute future abandons the call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    timeout: Option<Duration>,
}

impl Context {
    /// Creates a context with no deadline.
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Creates a context carrying a total-call timeout for the transport.
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// The timeout the transport should apply, if any.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// The resolved payload handed to the transport.
///
/// The merge phase picks exactly one variant; form and multipart payloads
/// stay structured because their wire encoding belongs to the transport.
#[derive(Debug)]
pub enum Payload {
    /// A ready byte payload (raw bytes, text, pre-serialized JSON, stream).
    Full(Body),
    /// URL-encoded form fields, to be encoded by the transport.
    Form(Params),
    /// Multipart form fields plus file parts.
    Multipart {
        /// Plain form fields.
        fields: Params,
        /// File parts registered on the request.
        files: Vec<File>,
    },
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Full(Body::empty())
    }
}

/// The finalized request the pipeline hands to the transport.
///
/// By the time a transport sees this, client and request state have been
/// merged: the URI carries substituted path parameters and the combined
/// query string, the header map holds the merged header set, and the payload
/// is resolved.
#[derive(Debug, Default)]
pub struct OutgoingRequest {
    method: Method,
    uri: Uri,
    host: Option<String>,
    headers: HeaderMap,
    cookies: Vec<Cookie<'static>>,
    payload: Payload,
    options: Extensions,
}

impl OutgoingRequest {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Sets the HTTP method.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// The final request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Sets the final request URI.
    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    /// The explicit host override, set when the merged headers carried a
    /// `Host` header.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Overrides the call target host.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = Some(host.into());
    }

    /// The merged header set.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the merged header set.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a ready byte payload.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.payload = Payload::Full(body.into());
    }

    /// Sets URL-encoded form fields as the payload.
    pub fn set_form_data(&mut self, fields: Params) {
        self.payload = Payload::Form(fields);
    }

    /// Sets a multipart payload of form fields and file parts.
    pub fn set_multipart(&mut self, fields: Params, files: Vec<File>) {
        self.payload = Payload::Multipart { fields, files };
    }

    /// The resolved payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Takes the payload, leaving an empty one. Transports use this to
    /// consume streaming bodies.
    pub fn take_payload(&mut self) -> Payload {
        std::mem::take(&mut self.payload)
    }

    /// Appends a cookie to send with the request.
    pub fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.cookies.push(cookie);
    }

    /// The cookies to send, in registration order.
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// Returns whether a cookie with the given name was registered.
    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|cookie| cookie.name() == name)
    }

    /// Stores a typed transport option.
    ///
    /// Options are opaque to this crate; a transport looks up the types it
    /// understands via [`get_option`](OutgoingRequest::get_option).
    pub fn set_option<T: Send + Sync + Clone + 'static>(&mut self, option: T) -> Option<T> {
        self.options.insert(option)
    }

    /// Returns a typed transport option, if one was stored.
    pub fn get_option<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.options.get()
    }
}

/// The raw response container a transport fills in.
///
/// The pipeline creates a fresh one per call; whatever the transport managed
/// to populate is exposed through [`Response`](crate::Response) afterwards,
/// even when the call itself failed.
#[derive(Debug, Default)]
pub struct RawResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// The status code, if the transport produced one.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Records the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the response headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Stores the response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

/// An asynchronous transport performing the actual network I/O.
///
/// `perform` receives the finalized request and a response container to
/// fill. Returning `Err` marks the call as failed; whatever was already
/// written into the container is still surfaced to the caller.
pub trait Transport: Send + Sync {
    /// Performs one network call.
    fn perform(
        &self,
        cx: &Context,
        request: &mut OutgoingRequest,
        response: &mut RawResponse,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

pub(crate) trait TransportImpl: Send + Sync {
    fn perform_inner<'this, 'cx, 'req, 'resp, 'fut>(
        &'this self,
        cx: &'cx Context,
        request: &'req mut OutgoingRequest,
        response: &'resp mut RawResponse,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'fut>>
    where
        'this: 'fut,
        'cx: 'fut,
        'req: 'fut,
        'resp: 'fut;

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<T: Transport> TransportImpl for T {
    fn perform_inner<'this, 'cx, 'req, 'resp, 'fut>(
        &'this self,
        cx: &'cx Context,
        request: &'req mut OutgoingRequest,
        response: &'resp mut RawResponse,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'fut>>
    where
        'this: 'fut,
        'cx: 'fut,
        'req: 'fut,
        'resp: 'fut,
    {
        Box::pin(self.perform(cx, request, response))
    }
}

/// Type-erased transport that can hold any [`Transport`] implementation.
///
/// [`Client`](crate::Client) stores its transport behind this wrapper so the
/// client type stays independent of the transport's concrete type.
pub struct AnyTransport(Box<dyn TransportImpl>);

impl AnyTransport {
    /// Wraps a transport implementation.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self(Box::new(transport))
    }

    /// The type name of the wrapped transport, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl Debug for AnyTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("AnyTransport[{}]", self.name()))
    }
}

impl Transport for AnyTransport {
    async fn perform(
        &self,
        cx: &Context,
        request: &mut OutgoingRequest,
        response: &mut RawResponse,
    ) -> Result<(), TransportError> {
        self.0.perform_inner(cx, request, response).await
    }
}
