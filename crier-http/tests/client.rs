use std::borrow::Cow;

use crier_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_json_decodes_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2, 3]})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        query: Some(vec![("limit", Cow::Borrowed("3"))]),
        ..Default::default()
    };
    let got: Value = client.get_json("v1/items", opts).await.unwrap();
    assert_eq!(got["items"][2], 3);
}

#[tokio::test]
async fn bearer_auth_is_attached_as_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/alpha"))
        .and(header("authorization", "Bearer sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        auth: Some(Auth::Bearer("sekrit")),
        ..Default::default()
    };
    let _: Value = client
        .get_json("2/users/by/username/alpha", opts)
        .await
        .unwrap();
}

#[tokio::test]
async fn exhausted_429_surfaces_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/1/tweets"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({"title": "Too Many Requests"})),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        retries: Some(0),
        ..Default::default()
    };
    let err = client
        .get_json::<Value>("2/users/1/tweets", opts)
        .await
        .unwrap_err();
    match err {
        HttpError::RateLimited {
            retry_after_secs, ..
        } => assert_eq!(retry_after_secs, Some(7)),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_retried_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42"})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        retries: Some(2),
        ..Default::default()
    };
    let got: Value = client.get_json("users/@me", opts).await.unwrap();
    assert_eq!(got["id"], "42");
}

#[tokio::test]
async fn api_error_extracts_feed_style_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/ghost"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{"detail": "Forbidden for this token", "title": "Forbidden"}]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let opts = RequestOpts {
        retries: Some(0),
        ..Default::default()
    };
    let err = client
        .get_json::<Value>("2/users/by/username/ghost", opts)
        .await
        .unwrap_err();
    match err {
        HttpError::Api {
            status, message, ..
        } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(message, "Forbidden for this token");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}
