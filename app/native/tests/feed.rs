//! Feed client against a local HTTP server.

mod common;

use std::time::Duration;

use walltaker_lib::feed::{
    Classification, FeedClient, FeedEndpoint, FetchError, classify, user_agent,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> FeedClient {
    FeedClient::new(FeedEndpoint::new(format!("{}/api/links/", server.uri()))).unwrap()
}

#[tokio::test]
async fn test_fetch_decodes_assignment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/links/7.json"))
        .and(header("user-agent", user_agent().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::assignment_json(
            7,
            "https://x/img.png",
            Some("Alice"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let assignment = client(&server).fetch(7).await.unwrap();

    let Classification::Actionable(item) = classify(assignment) else {
        panic!("expected actionable");
    };
    assert_eq!(item.media_url(), "https://x/img.png");
    assert_eq!(item.attribution(), Some("Alice"));
}

#[tokio::test]
async fn test_null_post_url_is_no_assignment() {
    let server = MockServer::start().await;
    Mock::given(path("/api/links/3.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::empty_assignment_json(3)))
        .mount(&server)
        .await;

    let assignment = client(&server).fetch(3).await.unwrap();

    assert_eq!(classify(assignment), Classification::NoAssignment { id: 3 });
}

#[tokio::test]
async fn test_non_success_status_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(path("/api/links/404.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).fetch(404).await.unwrap_err();

    match err {
        FetchError::Status { status, url } => {
            assert_eq!(status.as_u16(), 404);
            assert!(url.ends_with("/api/links/404.json"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(path("/api/links/5.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server).fetch(5).await.unwrap_err();

    assert!(matches!(err, FetchError::Malformed { .. }));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/api/links/9.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::empty_assignment_json(9))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let err = client(&server).fetch(9).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let endpoint = FeedEndpoint::new("http://127.0.0.1:9/api/links/");
    let err = FeedClient::new(endpoint).unwrap().fetch(1).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }));
}
