use crier_social::{FeedClient, FeedError, TwitterApi};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn api_against(server: &MockServer) -> TwitterApi {
    TwitterApi::with_base_url("test-bearer", &server.uri()).unwrap()
}

#[tokio::test]
async fn resolves_handle_to_account_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "123", "username": "alpha", "name": "Alpha"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_against(&server).await;
    let id = api.resolve_account_id("alpha").await.unwrap();
    assert_eq!(id, "123");
}

#[tokio::test]
async fn unknown_handle_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"title": "Not Found Error", "detail": "Could not find user with username: [ghost]."}]
        })))
        .mount(&server)
        .await;

    let api = api_against(&server).await;
    let err = api.resolve_account_id("ghost").await.unwrap_err();
    assert!(matches!(err, FeedError::NotFound(h) if h == "ghost"));
}

#[tokio::test]
async fn timeline_request_carries_since_id_and_maps_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/123/tweets"))
        .and(query_param("since_id", "5"))
        .and(query_param("max_results", "10"))
        .and(query_param("tweet.fields", "created_at"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "7", "text": "newest", "author_id": "123", "created_at": "2024-05-02T09:00:00.000Z"},
                {"id": "6", "text": "older", "author_id": "123", "created_at": "2024-05-01T09:00:00.000Z"}
            ],
            "includes": {"users": [{"id": "123", "username": "alpha"}]},
            "meta": {"result_count": 2, "newest_id": "7", "oldest_id": "6"}
        })))
        .mount(&server)
        .await;

    let api = api_against(&server).await;
    let posts = api.posts_since("123", Some("5"), 10).await.unwrap();
    assert_eq!(posts.len(), 2);
    // Newest-first order is passed through untouched.
    assert_eq!(posts[0].id, "7");
    assert_eq!(posts[1].id, "6");
    assert_eq!(posts[0].author_handle, "alpha");
    assert!(posts[0].created_at.is_some());
}

#[tokio::test]
async fn first_fetch_omits_since_filter_and_clamps_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/123/tweets"))
        .and(query_param_is_missing("since_id"))
        .and(query_param("max_results", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"result_count": 0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_against(&server).await;
    let posts = api.posts_since("123", None, 3).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn rate_limit_surfaces_as_feed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/123/tweets"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "30")
                .set_body_json(json!({"title": "Too Many Requests"})),
        )
        .mount(&server)
        .await;

    let api = api_against(&server).await;
    let err = api.posts_since("123", None, 10).await.unwrap_err();
    match err {
        FeedError::RateLimited { retry_after_secs } => {
            assert_eq!(retry_after_secs, Some(30));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn author_handle_falls_back_to_author_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/users/123/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "9", "text": "no includes here", "author_id": "123"}],
            "meta": {"result_count": 1}
        })))
        .mount(&server)
        .await;

    let api = api_against(&server).await;
    let posts = api.posts_since("123", None, 10).await.unwrap();
    assert_eq!(posts[0].author_handle, "123");
    assert!(posts[0].created_at.is_none());
}

#[test]
fn token_shape_is_checked_at_construction() {
    assert!(matches!(
        TwitterApi::new("   "),
        Err(FeedError::Config(_))
    ));
}
