//! The per-call request builder.
//!
//! A [`Request`] is derived from a [`Client`](crate::Client) via
//! [`Client::r`](crate::Client::r), configured through chained setters, and
//! consumed exactly once by a verb method ([`get`](Request::get),
//! [`post`](Request::post), ...), [`execute`](Request::execute), or
//! [`send`](Request::send). It borrows its client, so a request can never
//! outlive the client it came from.
//!
//! Request-level state always wins over client-level defaults per key; a key
//! the request never set inherits the client's full value list verbatim.
//!
//! # Examples
//!
//! ```rust
//! # use reqkit::{Client, transport::{Context, OutgoingRequest, RawResponse, Transport}};
//! # use reqkit::TransportError;
//! # use http::StatusCode;
//! # struct Noop;
//! # impl Transport for Noop {
//! #     async fn perform(&self, _: &Context, _: &mut OutgoingRequest, response: &mut RawResponse)
//! #         -> Result<(), TransportError> { response.set_status(StatusCode::OK); Ok(()) }
//! # }
//! # async fn example() -> Result<(), reqkit::Error> {
//! let client = Client::new(Noop);
//! let response = client
//!     .r()
//!     .set_path_param("id", "42")
//!     .set_query_param("page", "1")
//!     .get("https://api.example.com/users/{id}")
//!     .await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

use crate::body::Body;
use crate::params::Params;
use crate::transport::{Context, OutgoingRequest};
use crate::{Client, Response};
use cookie::Cookie;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt::{self, Debug};
use std::time::Duration;

/// A file part registered for a multipart upload.
///
/// Owns its content until execution hands it to the transport; the wire
/// encoding of the multipart form is the transport's job.
#[derive(Debug)]
pub struct File {
    field_name: String,
    file_name: String,
    content: Body,
}

impl File {
    /// Creates a file part from a form-field name, a file name, and a
    /// readable content source.
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Body>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content: content.into(),
        }
    }

    /// The form-field name this part is sent under.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The file name advertised in the part headers.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Borrows the content source.
    pub fn content(&self) -> &Body {
        &self.content
    }

    /// Consumes the part, returning its content source.
    pub fn into_content(self) -> Body {
        self.content
    }
}

/// A typed decode destination, bound at request-build time.
///
/// Captures a monomorphized JSON decode for `T`; the built-in post-response
/// hook runs it only when the matching status class arrives.
pub(crate) struct Binding {
    decode: Box<dyn Fn(&[u8]) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error> + Send + Sync>,
}

impl Binding {
    fn new<T: DeserializeOwned + Send + Sync + 'static>() -> Self {
        Self {
            decode: Box::new(|bytes| {
                let value: T = serde_json::from_slice(bytes)?;
                Ok(Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
        }
    }

    pub(crate) fn run(&self, bytes: &[u8]) -> Result<Box<dyn Any + Send + Sync>, serde_json::Error> {
        (self.decode)(bytes)
    }
}

impl Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Binding")
    }
}

/// A single-use request builder borrowing its [`Client`].
///
/// Created by [`Client::r`](crate::Client::r). All setters move `self` and
/// return it, so configuration chains fluently; the final verb method
/// consumes the request and runs the execution pipeline.
pub struct Request<'c> {
    pub(crate) client: &'c Client,
    pub(crate) url: String,
    pub(crate) method: Method,
    pub(crate) query_params: Params,
    pub(crate) path_params: Params,
    pub(crate) headers: HeaderMap,
    pub(crate) form_data: Params,
    pub(crate) files: Vec<File>,
    pub(crate) body: Body,
    pub(crate) context: Context,
    pub(crate) raw: OutgoingRequest,
    pub(crate) result_binding: Option<Binding>,
    pub(crate) error_binding: Option<Binding>,
}

impl<'c> Request<'c> {
    pub(crate) fn new(client: &'c Client) -> Self {
        Self {
            client,
            url: String::new(),
            method: Method::GET,
            query_params: Params::new(),
            path_params: Params::new(),
            headers: HeaderMap::new(),
            form_data: Params::new(),
            files: Vec::new(),
            body: Body::empty(),
            context: Context::new(),
            raw: OutgoingRequest::new(),
            result_binding: None,
            error_binding: None,
        }
    }

    /// The owning client.
    pub fn client(&self) -> &Client {
        self.client
    }

    /// The URL template as currently set. May contain `{name}` placeholders
    /// until the merge phase substitutes them.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sets the URL template for a later [`send`](Request::send).
    pub fn set_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// The HTTP method as currently set.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Sets the HTTP method for a later [`send`](Request::send).
    pub fn set_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replaces the values of a query parameter.
    pub fn set_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.set(key, value);
        self
    }

    /// Replaces several query parameters at once.
    pub fn set_query_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params.extend(params);
        self
    }

    /// Appends a value to a query parameter, producing an ordered
    /// multi-value list.
    pub fn add_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.add(key, value);
        self
    }

    /// Appends several query parameter values at once.
    pub fn add_query_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self.query_params.add(key, value);
        }
        self
    }

    /// Parses an encoded query string and appends every pair it contains.
    ///
    /// A string that fails to parse leaves the parameters unchanged.
    pub fn set_query_string(mut self, query: &str) -> Self {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query.trim()) {
            Ok(pairs) => {
                for (key, value) in pairs {
                    self.query_params.add(key, value);
                }
            }
            Err(error) => {
                tracing::warn!(%error, "ignoring unparseable query string");
            }
        }
        self
    }

    /// Sets a path parameter substituted for `{key}` in the URL template.
    ///
    /// Values are percent-escaped at merge time. A `{token}` with no
    /// matching parameter is left verbatim in the URL rather than treated as
    /// an error.
    pub fn set_path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.set(key, value);
        self
    }

    /// Sets several path parameters at once.
    pub fn set_path_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.path_params.extend(params);
        self
    }

    /// Sets a header, replacing any existing values.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted to a valid header value;
    /// passing one is a programming error, not a runtime condition.
    pub fn set_header<V>(mut self, name: HeaderName, value: V) -> Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Debug,
    {
        self.headers.insert(name, value.try_into().unwrap());
        self
    }

    /// Appends a header value without removing existing values.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted to a valid header value.
    pub fn add_header<V>(mut self, name: HeaderName, value: V) -> Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Debug,
    {
        self.headers.append(name, value.try_into().unwrap());
        self
    }

    /// Sets several headers at once, replacing existing values per name.
    pub fn set_headers<V>(mut self, headers: impl IntoIterator<Item = (HeaderName, V)>) -> Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Debug,
    {
        for (name, value) in headers {
            self.headers.insert(name, value.try_into().unwrap());
        }
        self
    }

    /// The request-level header set.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the request-level header set, for hooks.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets the content type from a parsed MIME type.
    ///
    /// Note that registered files or form data force their own content type
    /// at merge time, overriding this value.
    pub fn set_content_type(mut self, mime: mime::Mime) -> Self {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_str(mime.as_ref()).unwrap(),
        );
        self
    }

    /// Shorthand for an `application/json` content type.
    pub fn set_json_content_type(self) -> Self {
        self.set_content_type(mime::APPLICATION_JSON)
    }

    /// Shorthand for a `text/xml` content type.
    pub fn set_xml_content_type(self) -> Self {
        self.set_content_type(mime::TEXT_XML)
    }

    /// Shorthand for a `text/html` content type.
    pub fn set_html_content_type(self) -> Self {
        self.set_content_type(mime::TEXT_HTML)
    }

    /// Shorthand for an `application/x-www-form-urlencoded` content type.
    pub fn set_form_content_type(self) -> Self {
        self.set_content_type(mime::APPLICATION_WWW_FORM_URLENCODED)
    }

    /// Registers a cookie to send with this request.
    ///
    /// Cookies are proxied straight into the outgoing container; a client
    /// default cookie with the same name will not override it.
    pub fn set_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.raw.set_cookie(cookie);
        self
    }

    /// Registers several cookies at once.
    pub fn set_cookies(mut self, cookies: impl IntoIterator<Item = Cookie<'static>>) -> Self {
        for cookie in cookies {
            self.raw.set_cookie(cookie);
        }
        self
    }

    /// Sets the request body.
    ///
    /// The body variant is fixed here and never re-inspected; use
    /// [`json`](Request::json) to serialize a structured value, or the form
    /// and file setters for payloads the transport encodes.
    pub fn set_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes a value to JSON as the request body and sets the
    /// content-type header to `application/json`.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn json<T: serde::Serialize>(mut self, value: T) -> Result<Self, serde_json::Error> {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Body::from_json(value)?;
        Ok(self)
    }

    /// Replaces the values of a form field.
    ///
    /// Present form data forces the `application/x-www-form-urlencoded`
    /// content type at merge time (unless files are also registered).
    pub fn set_form_data<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form_data.extend(fields);
        self
    }

    /// Appends a value to a form field, producing a multi-value field.
    pub fn add_form_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.add(key, value);
        self
    }

    /// Registers a file part, switching the payload to
    /// `multipart/form-data`.
    pub fn file(mut self, file: File) -> Self {
        self.files.push(file);
        self
    }

    /// Registers a file part from its components.
    pub fn file_reader(
        self,
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Body>,
    ) -> Self {
        self.file(File::new(field_name, file_name, content))
    }

    /// Binds a typed destination for the response body on success statuses.
    ///
    /// The built-in post-response hook decodes the body as JSON into this
    /// slot only when the response status is a success; retrieve the value
    /// with [`Response::result`](crate::Response::result).
    pub fn bind_result<T: DeserializeOwned + Send + Sync + 'static>(mut self) -> Self {
        self.result_binding = Some(Binding::new::<T>());
        self
    }

    /// Binds a typed destination for the response body on error statuses.
    ///
    /// Retrieve the value with
    /// [`Response::error_value`](crate::Response::error_value).
    pub fn bind_error<T: DeserializeOwned + Send + Sync + 'static>(mut self) -> Self {
        self.error_binding = Some(Binding::new::<T>());
        self
    }

    /// Attaches the cancellation/deadline carrier threaded into the
    /// transport call.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Shorthand for a context carrying a total-call timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.with_context(Context::with_timeout(timeout))
    }

    /// Stores a typed option for the transport on the outgoing request.
    pub fn set_option<T: Send + Sync + Clone + 'static>(mut self, option: T) -> Self {
        self.raw.set_option(option);
        self
    }

    /// The staged outgoing container, for hooks that need to inspect it.
    pub fn outgoing(&self) -> &OutgoingRequest {
        &self.raw
    }

    /// Mutable access to the staged outgoing container.
    pub fn outgoing_mut(&mut self) -> &mut OutgoingRequest {
        &mut self.raw
    }

    /// Executes a GET request against `url`.
    pub async fn get(self, url: impl Into<String>) -> Result<Response, crate::Error> {
        self.execute(Method::GET, url).await
    }

    /// Executes a HEAD request against `url`.
    pub async fn head(self, url: impl Into<String>) -> Result<Response, crate::Error> {
        self.execute(Method::HEAD, url).await
    }

    /// Executes a POST request against `url`.
    pub async fn post(self, url: impl Into<String>) -> Result<Response, crate::Error> {
        self.execute(Method::POST, url).await
    }

    /// Executes a PUT request against `url`.
    pub async fn put(self, url: impl Into<String>) -> Result<Response, crate::Error> {
        self.execute(Method::PUT, url).await
    }

    /// Executes a DELETE request against `url`.
    pub async fn delete(self, url: impl Into<String>) -> Result<Response, crate::Error> {
        self.execute(Method::DELETE, url).await
    }

    /// Executes an OPTIONS request against `url`.
    pub async fn options(self, url: impl Into<String>) -> Result<Response, crate::Error> {
        self.execute(Method::OPTIONS, url).await
    }

    /// Executes a PATCH request against `url`.
    pub async fn patch(self, url: impl Into<String>) -> Result<Response, crate::Error> {
        self.execute(Method::PATCH, url).await
    }

    /// Executes the request with an explicit method and URL template.
    ///
    /// Consumes the request and runs the full pipeline: merge, pre-request
    /// hooks, the transport call, post-response hooks.
    pub async fn execute(
        mut self,
        method: Method,
        url: impl Into<String>,
    ) -> Result<Response, crate::Error> {
        self.method = method;
        self.url = url.into();
        self.client.execute(self).await
    }

    /// Executes the request using the previously set method and URL.
    pub async fn send(self) -> Result<Response, crate::Error> {
        self.client.execute(self).await
    }
}

impl Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query_params", &self.query_params)
            .field("path_params", &self.path_params)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
