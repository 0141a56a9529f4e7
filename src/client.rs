//! The reusable client and its execution pipeline.
//!
//! A [`Client`] holds the defaults applied to every request it derives
//! (query parameters, path parameters, headers, cookies) plus the hook
//! registry and the transport. It is built once, configured at setup time,
//! and then shared: wrap it in an `Arc` and run many executions
//! concurrently from different tasks. Hook registration stays safe during
//! traffic because each hook list sits behind its own reader-writer lock.
//!
//! The pipeline for one execution:
//!
//! 1. **Merging**: resolve the final URL, header set, cookies, and payload
//!    (request-level state wins per key). A merge failure aborts before any
//!    hook runs.
//! 2. **Pre-request hooks**: every user-defined hook, then every built-in
//!    hook, each in registration order; the first error aborts with no
//!    network call. An explicit `Host` header is then re-applied onto the
//!    outgoing call target.
//! 3. **Calling**: the transport performs the call; the receive timestamp
//!    is recorded whether or not it succeeded.
//! 4. **Post-response hooks**: only after a successful call, in
//!    registration order; the first error stops the chain and surfaces with
//!    the already-populated response.
//!
//! Nothing is retried at this layer; retries, like connection management,
//! belong to the transport.

use crate::error::Error;
use crate::middleware::{self, HookRegistry};
use crate::params::Params;
use crate::request::Request;
use crate::transport::{AnyTransport, RawResponse, Transport};
use crate::Response;
use cookie::Cookie;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt::{self, Debug};
use std::time::Instant;

/// A long-lived, shareable HTTP client front-end.
///
/// Defaults set here apply to every derived [`Request`] unless the request
/// overrides them per key. Mutating setters take `&mut self` and are meant
/// for setup time; hook registration takes `&self` and is safe at any
/// point, including while other tasks are mid-execution.
///
/// # Examples
///
/// ```rust
/// # use reqkit::{Client, transport::{Context, OutgoingRequest, RawResponse, Transport}};
/// # use reqkit::TransportError;
/// # struct Noop;
/// # impl Transport for Noop {
/// #     async fn perform(&self, _: &Context, _: &mut OutgoingRequest, _: &mut RawResponse)
/// #         -> Result<(), TransportError> { Ok(()) }
/// # }
/// let mut client = Client::new(Noop);
/// client
///     .set_header(http::header::USER_AGENT, "reqkit/0.1")
///     .set_query_param("token", "secret");
/// ```
pub struct Client {
    query_params: Params,
    path_params: Params,
    headers: HeaderMap,
    cookies: Vec<Cookie<'static>>,
    hooks: HookRegistry,
    transport: AnyTransport,
}

impl Client {
    /// Creates a client around a transport.
    ///
    /// The built-in hooks (payload resolution before the call, typed body
    /// decoding after it) are registered here, ahead of anything the
    /// caller registers later.
    pub fn new(transport: impl Transport + 'static) -> Self {
        let hooks = HookRegistry::new();
        hooks.register_builtin_before(Box::new(middleware::resolve_request_body));
        hooks.register_after(Box::new(middleware::decode_response));
        Self {
            query_params: Params::new(),
            path_params: Params::new(),
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            hooks,
            transport: AnyTransport::new(transport),
        }
    }

    /// Derives a fresh request borrowing this client.
    pub fn r(&self) -> Request<'_> {
        Request::new(self)
    }

    /// Alias for [`r`](Client::r).
    pub fn new_request(&self) -> Request<'_> {
        self.r()
    }

    /// Replaces the values of a default query parameter.
    pub fn set_query_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.query_params.set(key, value);
        self
    }

    /// Replaces several default query parameters at once.
    pub fn set_query_params<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params.extend(params);
        self
    }

    /// Appends a value to a default query parameter.
    pub fn add_query_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.query_params.add(key, value);
        self
    }

    /// Appends several default query parameter values at once.
    pub fn add_query_params<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self.query_params.add(key, value);
        }
        self
    }

    /// Sets a default path parameter.
    pub fn set_path_param(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.path_params.set(key, value);
        self
    }

    /// Sets several default path parameters at once.
    pub fn set_path_params<K, V>(&mut self, params: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.path_params.extend(params);
        self
    }

    /// Sets a default header, replacing existing values.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted to a valid header value.
    pub fn set_header<V>(&mut self, name: HeaderName, value: V) -> &mut Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Debug,
    {
        self.headers.insert(name, value.try_into().unwrap());
        self
    }

    /// Appends a default header value without removing existing values.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted to a valid header value.
    pub fn add_header<V>(&mut self, name: HeaderName, value: V) -> &mut Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Debug,
    {
        self.headers.append(name, value.try_into().unwrap());
        self
    }

    /// Sets several default headers at once.
    pub fn set_headers<V>(&mut self, headers: impl IntoIterator<Item = (HeaderName, V)>) -> &mut Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Debug,
    {
        for (name, value) in headers {
            self.headers.insert(name, value.try_into().unwrap());
        }
        self
    }

    /// Sets the default content type from a parsed MIME type.
    pub fn set_content_type(&mut self, mime: mime::Mime) -> &mut Self {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_str(mime.as_ref()).unwrap(),
        );
        self
    }

    /// Shorthand for an `application/json` default content type.
    pub fn set_json_content_type(&mut self) -> &mut Self {
        self.set_content_type(mime::APPLICATION_JSON)
    }

    /// Shorthand for a `text/xml` default content type.
    pub fn set_xml_content_type(&mut self) -> &mut Self {
        self.set_content_type(mime::TEXT_XML)
    }

    /// Shorthand for a `text/html` default content type.
    pub fn set_html_content_type(&mut self) -> &mut Self {
        self.set_content_type(mime::TEXT_HTML)
    }

    /// Shorthand for an `application/x-www-form-urlencoded` default content
    /// type.
    pub fn set_form_content_type(&mut self) -> &mut Self {
        self.set_content_type(mime::APPLICATION_WWW_FORM_URLENCODED)
    }

    /// Registers a default cookie sent with every request that does not set
    /// one of the same name.
    pub fn set_cookie(&mut self, cookie: Cookie<'static>) -> &mut Self {
        self.cookies.push(cookie);
        self
    }

    /// Registers several default cookies at once.
    pub fn set_cookies(&mut self, cookies: impl IntoIterator<Item = Cookie<'static>>) -> &mut Self {
        self.cookies.extend(cookies);
        self
    }

    /// The default query parameters.
    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    /// The default path parameters.
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// The default headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The default cookies.
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    /// Registers a user-defined pre-request hook.
    ///
    /// User-defined hooks run before every built-in hook, in registration
    /// order. Takes `&self`: registering is safe while other tasks execute
    /// concurrently, and an in-flight execution observes either the old or
    /// the new list, never a torn one.
    pub fn on_before_request<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Client, &mut Request<'_>) -> Result<(), crate::BoxError> + Send + Sync + 'static,
    {
        self.hooks.register_user_before(Box::new(hook));
        self
    }

    /// Registers a built-in pre-request hook.
    ///
    /// Built-ins run after every user-defined hook. Extensions that adapt
    /// transports or inject protocol concerns register theirs here so user
    /// hooks keep seeing the request first.
    pub fn on_before_request_builtin<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Client, &mut Request<'_>) -> Result<(), crate::BoxError> + Send + Sync + 'static,
    {
        self.hooks.register_builtin_before(Box::new(hook));
        self
    }

    /// Registers a post-response hook, run after the built-in decode hook
    /// in registration order.
    pub fn on_after_response<F>(&self, hook: F) -> &Self
    where
        F: Fn(&Client, &mut Response) -> Result<(), crate::BoxError> + Send + Sync + 'static,
    {
        self.hooks.register_after(Box::new(hook));
        self
    }

    /// Runs the execution pipeline for one consumed request.
    pub(crate) async fn execute(&self, mut request: Request<'_>) -> Result<Response, Error> {
        // Merging: any failure aborts before hooks run.
        middleware::parse_request_url(self, &mut request)?;
        middleware::parse_request_header(self, &mut request);
        middleware::parse_request_cookies(self, &mut request);

        // Pre-request hooks, under read guards held across the whole phase
        // so this execution sees one consistent snapshot of each list. The
        // guards drop before the transport await.
        {
            let user = self.hooks.user_before();
            let builtin = self.hooks.builtin_before();
            for hook in user.iter().chain(builtin.iter()) {
                hook.call(self, &mut request).map_err(Error::PreHook)?;
            }
        }

        // Re-apply an explicit Host header onto the call target.
        if let Some(host) = request
            .headers
            .get(http::header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
        {
            request.raw.set_host(host);
        }

        let Request {
            mut raw,
            method,
            headers,
            context,
            result_binding,
            error_binding,
            ..
        } = request;
        raw.set_method(method);
        *raw.headers_mut() = headers;

        tracing::debug!(
            method = %raw.method(),
            uri = %raw.uri(),
            transport = self.transport.name(),
            "sending request"
        );

        let started_at = Instant::now();
        let mut container = RawResponse::new();
        let outcome = self
            .transport
            .perform(&context, &mut raw, &mut container)
            .await;
        let received_at = Instant::now();

        let mut response = Response::new(container, received_at, result_binding, error_binding);

        match outcome {
            Ok(()) => {
                tracing::debug!(
                    status = ?response.status(),
                    elapsed = ?received_at.duration_since(started_at),
                    "response received"
                );
            }
            Err(source) => {
                tracing::debug!(
                    error = %source,
                    elapsed = ?received_at.duration_since(started_at),
                    "transport call failed"
                );
                return Err(Error::Transport {
                    source,
                    response: Box::new(response),
                });
            }
        }

        // Post-response hooks: first failure stops the chain but keeps the
        // populated response available inside the error.
        let after = self.hooks.after();
        for hook in after.iter() {
            if let Err(source) = hook.call(self, &mut response) {
                return Err(Error::PostHook {
                    source,
                    response: Box::new(response),
                });
            }
        }
        drop(after);

        Ok(response)
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("query_params", &self.query_params)
            .field("path_params", &self.path_params)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies.len())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
