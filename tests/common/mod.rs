//! Shared test support: a scripted transport that records what reached it.

#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use reqkit::transport::{Context, OutgoingRequest, Payload, RawResponse, Transport};
use reqkit::{HeaderMap, Method, StatusCode, TransportError};
use std::sync::Arc;

/// What one call to the transport looked like, after all merging and hooks.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: String,
    pub host: Option<String>,
    pub headers: HeaderMap,
    pub cookies: Vec<(String, String)>,
    pub payload: CapturedPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CapturedPayload {
    Body(Bytes),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        file_names: Vec<String>,
    },
}

struct Script {
    status: StatusCode,
    body: Bytes,
    headers: Vec<(String, String)>,
    fail: Option<String>,
    calls: Vec<Captured>,
}

/// A transport that answers from a script and records every call.
///
/// Cloning shares the script and the call log, so a test can keep a handle
/// while the client owns another.
#[derive(Clone)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                status: StatusCode::OK,
                body: Bytes::new(),
                headers: Vec::new(),
                fail: None,
                calls: Vec::new(),
            })),
        }
    }

    pub fn respond(self, status: StatusCode, body: impl Into<Bytes>) -> Self {
        {
            let mut script = self.script.lock();
            script.status = status;
            script.body = body.into();
        }
        self
    }

    pub fn respond_header(self, name: &str, value: &str) -> Self {
        self.script
            .lock()
            .headers
            .push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn fail_with(self, message: &str) -> Self {
        self.script.lock().fail = Some(message.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<Captured> {
        self.script.lock().calls.clone()
    }

    pub fn last_call(&self) -> Captured {
        self.calls().last().cloned().unwrap()
    }

    pub fn call_count(&self) -> usize {
        self.script.lock().calls.len()
    }
}

impl Transport for MockTransport {
    async fn perform(
        &self,
        _cx: &Context,
        request: &mut OutgoingRequest,
        response: &mut RawResponse,
    ) -> Result<(), TransportError> {
        let payload = match request.take_payload() {
            Payload::Full(body) => CapturedPayload::Body(
                body.into_bytes().await.map_err(TransportError::from)?,
            ),
            Payload::Form(fields) => CapturedPayload::Form(
                fields
                    .pairs()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
            ),
            Payload::Multipart { fields, files } => CapturedPayload::Multipart {
                fields: fields
                    .pairs()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
                file_names: files.iter().map(|f| f.file_name().to_owned()).collect(),
            },
        };

        let captured = Captured {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            host: request.host().map(str::to_owned),
            headers: request.headers().clone(),
            cookies: request
                .cookies()
                .iter()
                .map(|c| (c.name().to_owned(), c.value().to_owned()))
                .collect(),
            payload,
        };

        let mut script = self.script.lock();
        script.calls.push(captured);
        if let Some(message) = &script.fail {
            return Err(TransportError::msg(message.clone()));
        }
        response.set_status(script.status);
        response.set_body(script.body.clone());
        for (name, value) in &script.headers {
            response.headers_mut().append(
                name.parse::<reqkit::HeaderName>().unwrap(),
                value.parse().unwrap(),
            );
        }
        Ok(())
    }
}
