//! Request body handling.
//!
//! [`Body`] is a closed tagged representation of an outgoing payload. The
//! variant is chosen once, when the caller sets the body, and never
//! re-inspected afterwards:
//!
//! - **Bytes**: in-memory payloads (raw bytes, text, pre-serialized JSON)
//! - **Reader**: streaming from files or other async sources
//! - **Stream**: general async chunk streams
//!
//! Form fields and multipart files are *not* body variants; they stay as
//! structured data on the request and reach the transport through
//! [`Payload`](crate::transport::Payload), because their wire encoding is the
//! transport's job.
//!
//! # Examples
//!
//! ```rust
//! use reqkit::Body;
//!
//! let empty = Body::empty();
//! assert_eq!(empty.len(), Some(0));
//!
//! let text = Body::from_bytes("Hello, world!");
//! assert_eq!(text.len(), Some(13));
//! ```

use bytes::Bytes;
use bytestr::ByteStr;
use futures_lite::{ready, AsyncBufRead, AsyncBufReadExt, Stream, StreamExt};
use std::fmt::{self, Debug};
use std::io;
use std::mem::take;
use std::pin::Pin;
use std::task::{Context, Poll};

type BoxBufReader = Pin<Box<dyn AsyncBufRead + Send + Sync + 'static>>;
type BoxStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync + 'static>>;

/// An outgoing request payload.
///
/// Construct one with [`Body::from_bytes`], [`Body::from_json`],
/// [`Body::from_form`], [`Body::from_reader`], [`Body::from_stream`], or
/// [`Body::from_file`], then attach it with
/// [`Request::set_body`](crate::Request::set_body).
///
/// A `Body` is also a [`Stream`] of [`Bytes`] chunks, which is how transports
/// are expected to drain it when they do not want the whole payload buffered.
pub struct Body {
    inner: BodyInner,
}

enum BodyInner {
    Once(Bytes),
    Reader {
        reader: BoxBufReader,
        length: Option<usize>,
    },
    Stream(BoxStream),
}

impl Body {
    /// Creates an empty body.
    pub const fn empty() -> Self {
        Self {
            inner: BodyInner::Once(Bytes::new()),
        }
    }

    /// Creates a body from in-memory bytes.
    ///
    /// Accepts anything convertible to [`Bytes`]: `Vec<u8>`, `String`,
    /// `&'static str`, byte slices, and `Bytes` itself.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: BodyInner::Once(bytes.into()),
        }
    }

    /// Creates a body from UTF-8 text.
    pub fn from_text(text: impl Into<ByteStr>) -> Self {
        Self::from_bytes(text.into().into_bytes())
    }

    /// Serializes a value to JSON and stores the result as an in-memory body.
    ///
    /// Serialization happens here, once; the body is plain bytes afterwards.
    /// The content-type header is *not* set by this constructor; use
    /// [`Request::json`](crate::Request::json) for that.
    pub fn from_json<T: serde::Serialize>(value: T) -> Result<Self, serde_json::Error> {
        Ok(Self::from_bytes(serde_json::to_vec(&value)?))
    }

    /// Serializes a value as a URL-encoded form body.
    pub fn from_form<T: serde::Serialize>(value: T) -> Result<Self, serde_urlencoded::ser::Error> {
        Ok(Self::from_bytes(serde_urlencoded::to_string(value)?))
    }

    /// Creates a streaming body from an async buffered reader.
    ///
    /// `length`, when known, becomes the body's size hint.
    pub fn from_reader(
        reader: impl AsyncBufRead + Send + Sync + 'static,
        length: impl Into<Option<usize>>,
    ) -> Self {
        Self {
            inner: BodyInner::Reader {
                reader: Box::pin(reader),
                length: length.into(),
            },
        }
    }

    /// Creates a body from an async stream of byte chunks.
    pub fn from_stream(
        stream: impl Stream<Item = io::Result<Bytes>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: BodyInner::Stream(Box::pin(stream)),
        }
    }

    /// Opens a file and streams its contents as the body.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the file cannot be opened or its metadata read.
    pub async fn from_file(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let file = async_fs::File::open(path.as_ref()).await?;
        let len = file.metadata().await?.len() as usize;
        Ok(Self::from_reader(futures_lite::io::BufReader::new(file), len))
    }

    /// Returns the body length in bytes, if known up front.
    pub fn len(&self) -> Option<usize> {
        match &self.inner {
            BodyInner::Once(bytes) => Some(bytes.len()),
            BodyInner::Reader { length, .. } => *length,
            BodyInner::Stream(_) => None,
        }
    }

    /// Returns whether the body is empty, if its length is known.
    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }

    /// Consumes the body and returns all its data as `Bytes`.
    ///
    /// Streaming variants are read to the end and concatenated.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the underlying reader or stream fails.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self.inner {
            BodyInner::Once(bytes) => Ok(bytes),
            BodyInner::Reader { mut reader, length } => {
                let mut vec = Vec::with_capacity(length.unwrap_or_default());
                loop {
                    let data = reader.fill_buf().await?;
                    if data.is_empty() {
                        break;
                    }
                    let len = data.len();
                    vec.extend_from_slice(data);
                    reader.as_mut().consume(len);
                }
                Ok(vec.into())
            }
            BodyInner::Stream(mut stream) => {
                let mut vec = Vec::new();
                while let Some(chunk) = stream.try_next().await? {
                    vec.extend_from_slice(&chunk);
                }
                Ok(vec.into())
            }
        }
    }

    /// Consumes the body and returns its data as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if reading fails or the data is not valid UTF-8.
    pub async fn into_string(self) -> io::Result<ByteStr> {
        ByteStr::from_utf8(self.into_bytes().await?)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error.to_string()))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            BodyInner::Once(bytes) => f.debug_tuple("Body::Once").field(&bytes.len()).finish(),
            BodyInner::Reader { length, .. } => {
                f.debug_struct("Body::Reader").field("length", length).finish()
            }
            BodyInner::Stream(_) => f.debug_tuple("Body::Stream").finish(),
        }
    }
}

impl Stream for Body {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match &mut self.inner {
            BodyInner::Once(bytes) => {
                if bytes.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(take(bytes))))
                }
            }
            BodyInner::Reader { reader, length } => {
                let data = ready!(reader.as_mut().poll_fill_buf(cx))?;
                if data.is_empty() {
                    return Poll::Ready(None);
                }
                let data = Bytes::copy_from_slice(data);
                reader.as_mut().consume(data.len());
                if let Some(known_length) = length {
                    *known_length = known_length.saturating_sub(data.len());
                }
                Poll::Ready(Some(Ok(data)))
            }
            BodyInner::Stream(stream) => stream.as_mut().poll_next(cx),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            BodyInner::Once(bytes) => (bytes.len(), Some(bytes.len())),
            BodyInner::Reader { length, .. } => (0, *length),
            BodyInner::Stream(stream) => stream.size_hint(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(text)
    }
}

impl From<ByteStr> for Body {
    fn from(text: ByteStr) -> Self {
        Self::from_text(text)
    }
}
