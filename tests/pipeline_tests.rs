//! Execution pipeline behavior: hook ordering, abort semantics, body
//! resolution, and typed decoding.

mod common;

use common::{CapturedPayload, MockTransport};
use parking_lot::Mutex;
use reqkit::{header, Client, Error, Method, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ApiError {
    code: u32,
    message: String,
}

#[tokio::test]
async fn user_hooks_run_before_builtin_hooks() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    let order = Arc::new(Mutex::new(Vec::new()));
    let seen = order.clone();
    client.on_before_request_builtin(move |_client, _request| {
        seen.lock().push("builtin");
        Ok(())
    });
    let seen = order.clone();
    client.on_before_request(move |_client, _request| {
        seen.lock().push("user");
        Ok(())
    });

    client.r().get("https://example.com/").await.unwrap();

    assert_eq!(*order.lock(), ["user", "builtin"]);
}

#[tokio::test]
async fn pre_hook_error_aborts_without_calling_transport() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());
    client.on_before_request(|_client, _request| Err("not today".into()));

    let error = client.r().get("https://example.com/").await.unwrap_err();

    assert!(matches!(error, Error::PreHook(_)));
    assert!(error.response().is_none());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn pre_hooks_can_mutate_the_request() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());
    client.on_before_request(|_client, request| {
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer hooked".parse()?);
        Ok(())
    });

    client.r().get("https://example.com/").await.unwrap();

    assert_eq!(
        transport.last_call().headers.get(header::AUTHORIZATION).unwrap(),
        "Bearer hooked"
    );
}

#[tokio::test]
async fn transport_failure_carries_the_response() {
    let transport = MockTransport::new().fail_with("connection refused");
    let client = Client::new(transport.clone());

    let error = client.r().get("https://example.com/").await.unwrap_err();

    assert!(matches!(error, Error::Transport { .. }));
    let response = error.into_response().unwrap();
    assert_eq!(response.status(), None);
    assert!(!response.is_success());
    assert!(!response.is_error());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn post_hook_failure_keeps_the_populated_response() {
    let transport = MockTransport::new().respond(StatusCode::OK, "payload");
    let client = Client::new(transport.clone());
    client.on_after_response(|_client, _response| Err("audit rejected".into()));

    let error = client.r().get("https://example.com/").await.unwrap_err();

    assert!(matches!(error, Error::PostHook { .. }));
    let response = error.response().unwrap();
    assert_eq!(response.status(), Some(StatusCode::OK));
    assert_eq!(response.body_string(), "payload");
}

#[tokio::test]
async fn post_hook_failure_stops_the_remaining_hooks() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    let reached = Arc::new(Mutex::new(false));
    client.on_after_response(|_client, _response| Err("boom".into()));
    let flag = reached.clone();
    client.on_after_response(move |_client, _response| {
        *flag.lock() = true;
        Ok(())
    });

    client.r().get("https://example.com/").await.unwrap_err();

    assert!(!*reached.lock());
}

#[tokio::test]
async fn bound_result_decodes_on_success() {
    let transport =
        MockTransport::new().respond(StatusCode::OK, r#"{"id":42,"name":"gopher"}"#);
    let client = Client::new(transport.clone());

    let response = client
        .r()
        .bind_result::<User>()
        .bind_error::<ApiError>()
        .get("https://example.com/users/42")
        .await
        .unwrap();

    assert_eq!(
        response.result::<User>(),
        Some(&User {
            id: 42,
            name: "gopher".to_owned()
        })
    );
    assert!(response.error_value::<ApiError>().is_none());
}

#[tokio::test]
async fn bound_error_decodes_on_error_status() {
    let transport = MockTransport::new()
        .respond(StatusCode::NOT_FOUND, r#"{"code":404,"message":"no such user"}"#);
    let client = Client::new(transport.clone());

    let response = client
        .r()
        .bind_result::<User>()
        .bind_error::<ApiError>()
        .get("https://example.com/users/0")
        .await
        .unwrap();

    assert!(response.is_error());
    assert!(response.result::<User>().is_none());
    assert_eq!(
        response.error_value::<ApiError>(),
        Some(&ApiError {
            code: 404,
            message: "no such user".to_owned()
        })
    );
}

#[tokio::test]
async fn undecodable_body_without_binding_is_not_an_error() {
    let transport = MockTransport::new().respond(StatusCode::OK, "plain text, not json");
    let client = Client::new(transport.clone());

    let response = client.r().get("https://example.com/").await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.body_string(), "plain text, not json");
}

#[tokio::test]
async fn undecodable_body_with_binding_fails_as_post_hook() {
    let transport = MockTransport::new().respond(StatusCode::OK, "plain text, not json");
    let client = Client::new(transport.clone());

    let error = client
        .r()
        .bind_result::<User>()
        .get("https://example.com/")
        .await
        .unwrap_err();

    assert!(matches!(error, Error::PostHook { .. }));
    assert_eq!(error.response().unwrap().status(), Some(StatusCode::OK));
}

#[tokio::test]
async fn status_classification_boundaries() {
    for (status, success, error) in [
        (StatusCode::OK, true, false),
        (StatusCode::IM_USED, true, false),
        (StatusCode::MULTIPLE_CHOICES, false, false),
        (StatusCode::NOT_MODIFIED, false, false),
        (StatusCode::BAD_REQUEST, false, true),
        (StatusCode::INTERNAL_SERVER_ERROR, false, true),
    ] {
        let transport = MockTransport::new().respond(status, "");
        let client = Client::new(transport);
        let response = client.r().get("https://example.com/").await.unwrap();
        assert_eq!(response.is_success(), success, "{status}");
        assert_eq!(response.is_error(), error, "{status}");
    }
}

#[tokio::test]
async fn form_data_becomes_a_form_payload_and_forces_content_type() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .set_content_type(reqkit::mime::APPLICATION_JSON)
        .set_form_data([("user", "gopher"), ("lang", "rust")])
        .post("https://example.com/login")
        .await
        .unwrap();

    let call = transport.last_call();
    assert_eq!(
        call.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/x-www-form-urlencoded"
    );
    assert_eq!(
        call.payload,
        CapturedPayload::Form(vec![
            ("user".to_owned(), "gopher".to_owned()),
            ("lang".to_owned(), "rust".to_owned()),
        ])
    );
}

#[tokio::test]
async fn files_force_a_multipart_payload() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .add_form_data("note", "profile picture")
        .file(reqkit::File::new("avatar", "me.png", "binary bytes"))
        .post("https://example.com/upload")
        .await
        .unwrap();

    let call = transport.last_call();
    assert_eq!(
        call.headers.get(header::CONTENT_TYPE).unwrap(),
        "multipart/form-data"
    );
    assert_eq!(
        call.payload,
        CapturedPayload::Multipart {
            fields: vec![("note".to_owned(), "profile picture".to_owned())],
            file_names: vec!["me.png".to_owned()],
        }
    );
}

#[tokio::test]
async fn json_body_sets_content_type_and_bytes() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .json(serde_json::json!({"name": "gopher"}))
        .unwrap()
        .post("https://example.com/users")
        .await
        .unwrap();

    let call = transport.last_call();
    assert_eq!(
        call.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(
        call.payload,
        CapturedPayload::Body(bytes::Bytes::from(r#"{"name":"gopher"}"#))
    );
}

#[tokio::test]
async fn content_type_shortcuts_set_the_header() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .set_xml_content_type()
        .set_body("<ping/>")
        .post("https://example.com/echo")
        .await
        .unwrap();

    assert_eq!(
        transport.last_call().headers.get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
}

#[tokio::test]
async fn send_uses_the_stored_method_and_url() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .set_method(Method::DELETE)
        .set_url("https://example.com/items/9")
        .send()
        .await
        .unwrap();

    let call = transport.last_call();
    assert_eq!(call.method, Method::DELETE);
    assert_eq!(call.uri, "https://example.com/items/9");
}

#[tokio::test]
async fn response_exposes_parsed_set_cookie_headers() {
    let transport = MockTransport::new()
        .respond(StatusCode::OK, "")
        .respond_header("set-cookie", "session=abc123; HttpOnly");
    let client = Client::new(transport);

    let response = client.r().get("https://example.com/").await.unwrap();

    let cookies = response.cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name(), "session");
    assert_eq!(cookies[0].value(), "abc123");
}
