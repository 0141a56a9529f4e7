#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]
//! A fluent request-builder layer over pluggable HTTP transports.
//!
//! This crate provides a chainable API for composing HTTP requests on top of
//! a reusable client: defaults set once on the [`Client`] merge into every
//! derived [`Request`], with per-request values winning key by key. The
//! actual network call is delegated to a [`Transport`](transport::Transport)
//! implementation supplied at client construction, which keeps the builder
//! layer independent of any particular HTTP engine.
//!
//! # Features
//!
//! - **Fluent builders** - Chainable setters for query parameters, path
//!   parameters, headers, cookies, and bodies, ending in a verb call
//! - **Layered defaults** - Client-level values apply to every request and
//!   are overridden per key by request-level values
//! - **Hook pipeline** - Pre-request and post-response hooks registered on
//!   the client, runnable concurrently with registration
//! - **Typed decoding** - Bind result and error types per request; the
//!   response decodes into whichever slot its status selects
//! - **Pluggable transports** - Any type implementing
//!   [`Transport`](transport::Transport) performs the call
//!
//! # Examples
//!
//! ```rust
//! use reqkit::transport::{Context, OutgoingRequest, RawResponse, Transport};
//! use reqkit::{Client, Result, TransportError};
//!
//! struct Loopback;
//!
//! impl Transport for Loopback {
//!     async fn perform(
//!         &self,
//!         _cx: &Context,
//!         request: &mut OutgoingRequest,
//!         response: &mut RawResponse,
//!     ) -> Result<(), TransportError> {
//!         response.set_status(reqkit::StatusCode::OK);
//!         response.set_body(request.uri().to_string());
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let mut client = Client::new(Loopback);
//! client.set_query_param("token", "secret");
//!
//! let response = client
//!     .r()
//!     .set_header(reqkit::header::ACCEPT, "application/json")
//!     .get("https://example.com/users/42")
//!     .await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{BoxError, Error, Result, TransportError};

mod params;
pub use params::Params;

mod body;
pub use body::Body;

pub mod transport;

pub mod middleware;
#[doc(inline)]
pub use middleware::{RequestHook, ResponseHook};

mod request;
pub use request::{File, Request};

mod response;
pub use response::Response;

mod client;
pub use client::Client;

pub use cookie;
pub use mime;

pub use http::{
    header, method, uri, Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri,
};
