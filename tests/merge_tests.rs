//! Merging behavior: how client defaults and request values combine into
//! the final URL, header set, and cookies.

mod common;

use common::MockTransport;
use cookie::Cookie;
use reqkit::{header, Client, HeaderName, Params};

fn query_pairs(uri: &str) -> Vec<(String, String)> {
    let raw = uri.split_once('?').map(|(_, q)| q).unwrap_or("");
    serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap()
}

#[test]
fn params_set_replaces_add_appends() {
    let mut params = Params::new();
    params.set("page", "1");
    params.add("page", "2");
    assert_eq!(params.get("page"), Some("1"));
    assert_eq!(params.get_all("page"), ["1", "2"]);

    params.set("page", "3");
    assert_eq!(params.get_all("page"), ["3"]);
}

#[tokio::test]
async fn path_params_substitute_and_merge() {
    let transport = MockTransport::new();
    let mut client = Client::new(transport.clone());
    client.set_path_param("postId", "7");

    client
        .r()
        .set_path_param("id", "42")
        .get("https://example.com/users/{id}/posts/{postId}")
        .await
        .unwrap();

    let call = transport.last_call();
    assert_eq!(call.uri, "https://example.com/users/42/posts/7");
}

#[tokio::test]
async fn request_path_param_wins_over_client_default() {
    let transport = MockTransport::new();
    let mut client = Client::new(transport.clone());
    client.set_path_param("id", "client");

    client
        .r()
        .set_path_param("id", "request")
        .get("https://example.com/items/{id}")
        .await
        .unwrap();

    assert_eq!(transport.last_call().uri, "https://example.com/items/request");
}

#[tokio::test]
async fn unmatched_path_tokens_stay_verbatim() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .set_path_param("other", "unrelated")
        .get("https://example.com/items/{missing}")
        .await
        .unwrap();

    assert!(transport.last_call().uri.contains("{missing}"));
}

#[tokio::test]
async fn path_param_values_are_percent_escaped() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .set_path_param("name", "a b/c")
        .get("https://example.com/files/{name}")
        .await
        .unwrap();

    assert_eq!(transport.last_call().uri, "https://example.com/files/a%20b%2Fc");
}

#[tokio::test]
async fn query_merge_keeps_inline_query_and_defaults() {
    let transport = MockTransport::new();
    let mut client = Client::new(transport.clone());
    client.set_query_param("token", "secret");

    client
        .r()
        .set_query_param("page", "2")
        .get("https://example.com/search?q=rust")
        .await
        .unwrap();

    let pairs = query_pairs(&transport.last_call().uri);
    assert!(pairs.contains(&("q".into(), "rust".into())));
    assert!(pairs.contains(&("page".into(), "2".into())));
    assert!(pairs.contains(&("token".into(), "secret".into())));
}

#[tokio::test]
async fn request_query_param_replaces_whole_client_list() {
    let transport = MockTransport::new();
    let mut client = Client::new(transport.clone());
    client.add_query_param("tag", "a");
    client.add_query_param("tag", "b");

    client
        .r()
        .set_query_param("tag", "mine")
        .get("https://example.com/")
        .await
        .unwrap();

    let pairs = query_pairs(&transport.last_call().uri);
    let tags: Vec<_> = pairs.iter().filter(|(k, _)| k == "tag").collect();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].1, "mine");
}

#[tokio::test]
async fn multi_value_query_params_all_survive() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .add_query_param("id", "1")
        .add_query_param("id", "2")
        .get("https://example.com/")
        .await
        .unwrap();

    let pairs = query_pairs(&transport.last_call().uri);
    assert!(pairs.contains(&("id".into(), "1".into())));
    assert!(pairs.contains(&("id".into(), "2".into())));
}

#[tokio::test]
async fn set_query_string_parses_pairs() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .set_query_string("a=1&b=two%20words")
        .get("https://example.com/")
        .await
        .unwrap();

    let pairs = query_pairs(&transport.last_call().uri);
    assert!(pairs.contains(&("a".into(), "1".into())));
    assert!(pairs.contains(&("b".into(), "two words".into())));
}

#[tokio::test]
async fn request_headers_win_client_headers_fill_gaps() {
    let transport = MockTransport::new();
    let mut client = Client::new(transport.clone());
    client.set_header(header::USER_AGENT, "client-agent");
    client.set_header(header::ACCEPT, "text/plain");

    client
        .r()
        .set_header(header::ACCEPT, "application/json")
        .get("https://example.com/")
        .await
        .unwrap();

    let headers = transport.last_call().headers;
    assert_eq!(headers.get(header::ACCEPT).unwrap(), "application/json");
    assert_eq!(headers.get(header::USER_AGENT).unwrap(), "client-agent");
}

#[tokio::test]
async fn multi_value_client_header_appends_all_values() {
    let transport = MockTransport::new();
    let mut client = Client::new(transport.clone());
    let name = HeaderName::from_static("x-trace");
    client.add_header(name.clone(), "one");
    client.add_header(name.clone(), "two");

    client.r().get("https://example.com/").await.unwrap();

    let headers = transport.last_call().headers;
    let values: Vec<_> = headers.get_all(&name).iter().collect();
    assert_eq!(values, ["one", "two"]);
}

#[tokio::test]
async fn host_header_reaches_the_call_target() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    client
        .r()
        .set_header(header::HOST, "internal.example.com")
        .get("https://10.0.0.1/")
        .await
        .unwrap();

    assert_eq!(
        transport.last_call().host.as_deref(),
        Some("internal.example.com")
    );
}

#[tokio::test]
async fn client_cookie_applies_unless_request_has_same_name() {
    let transport = MockTransport::new();
    let mut client = Client::new(transport.clone());
    client.set_cookie(Cookie::new("session", "client"));
    client.set_cookie(Cookie::new("theme", "dark"));

    client
        .r()
        .set_cookie(Cookie::new("session", "request"))
        .get("https://example.com/")
        .await
        .unwrap();

    let mut cookies = transport.last_call().cookies;
    cookies.sort();
    assert_eq!(
        cookies,
        [
            ("session".to_owned(), "request".to_owned()),
            ("theme".to_owned(), "dark".to_owned()),
        ]
    );
}

#[tokio::test]
async fn invalid_url_fails_before_the_transport() {
    let transport = MockTransport::new();
    let client = Client::new(transport.clone());

    let error = client.r().get("http://exa mple.com/").await.unwrap_err();
    assert!(matches!(error, reqkit::Error::UrlParse(_)));
    assert_eq!(transport.call_count(), 0);
}
