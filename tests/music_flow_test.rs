//! Integration tests for the music generation request flow.

use std::time::Duration;

use sentifl_client::api::PostSummary;
use sentifl_client::music::MusicRequestFlow;
use sentifl_client::navigation::{Route, SongResult};
use sentifl_client::session::Session;
use sentifl_client::ClientError;
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POST_URL: &str = "https://bucket.s3.amazonaws.com/posts/alice/7.json";

fn posts() -> Vec<PostSummary> {
    vec![
        PostSummary {
            post_id: 7,
            post_url: POST_URL.to_string(),
            thumbnail_url: None,
            created_time: "2024-05-01T10:00:00".to_string(),
            modified_time: None,
        },
        PostSummary {
            post_id: 3,
            post_url: "https://bucket.s3.amazonaws.com/posts/alice/3.json".to_string(),
            thumbnail_url: None,
            created_time: "2024-04-01T10:00:00".to_string(),
            modified_time: None,
        },
    ]
}

fn selected_flow(server: &MockServer) -> MusicRequestFlow {
    let mut flow = MusicRequestFlow::new(reqwest::Client::new(), &server.uri());
    flow.select(&posts(), 7).expect("post exists");
    flow
}

fn song_body() -> serde_json::Value {
    json!({
        "url": "https://music.example.com/songs/abc.mp3",
        "emotion1": "joy",
        "emotion2": "nostalgia",
        "title": "Spring Walk"
    })
}

#[tokio::test]
async fn test_generate_routes_to_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create/music"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({
            "user_id": "alice",
            "post_url": POST_URL,
            "token": "tok"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(song_body()))
        .expect(1)
        .mount(&server)
        .await;

    let flow = selected_flow(&server);
    let route = flow
        .generate(&posts(), &Session::authenticated("alice", "tok"))
        .await
        .expect("generation failed");

    assert_eq!(route.path(), "/song-result");
    assert_eq!(
        route,
        Route::SongResult(SongResult {
            title: "Spring Walk".to_string(),
            emotion1: "joy".to_string(),
            emotion2: "nostalgia".to_string(),
            music_url: "https://music.example.com/songs/abc.mp3".to_string(),
            post_id: 7,
        })
    );
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn test_missing_credential_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(song_body()))
        .expect(0)
        .mount(&server)
        .await;

    let session = Session {
        uid: Some("alice".to_string()),
        ..Session::default()
    };
    let err = selected_flow(&server)
        .generate(&posts(), &session)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Precondition(_)));
    assert_eq!(err.user_message(), "Please log in first.");
}

#[tokio::test]
async fn test_second_request_rejected_while_busy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create/music"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(song_body())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let flow = selected_flow(&server);
    let session = Session::authenticated("alice", "tok");
    let posts = posts();

    let (first, second) = tokio::join!(
        flow.generate(&posts, &session),
        flow.generate(&posts, &session)
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(ClientError::Busy)));
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn test_service_error_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create/music"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"errorCode": "CE1"})))
        .expect(1)
        .mount(&server)
        .await;

    let flow = selected_flow(&server);
    let err = flow
        .generate(&posts(), &Session::authenticated("alice", "tok"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Status { .. }));
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn test_malformed_body_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create/music"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "half"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = selected_flow(&server)
        .generate(&posts(), &Session::authenticated("alice", "tok"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Decode { .. }));
}

#[tokio::test]
async fn test_reselect_uses_latest_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create/music"))
        .and(body_json(json!({
            "user_id": "alice",
            "post_url": "https://bucket.s3.amazonaws.com/posts/alice/3.json",
            "token": "tok"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(song_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut flow = selected_flow(&server);
    flow.select(&posts(), 3).unwrap();

    let route = flow
        .generate(&posts(), &Session::authenticated("alice", "tok"))
        .await
        .unwrap();
    assert!(matches!(route, Route::SongResult(SongResult { post_id: 3, .. })));
}
