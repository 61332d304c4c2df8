//! The reqwest transport against a local mock HTTP server.
//!
//! Run with: `cargo test -p mediabox-api-client --test reqwest_transport_test`

use mediabox_api_client::api::PageQuery;
use mediabox_api_client::http::{ApiRequest, HttpTransport, ReqwestTransport};
use mediabox_api_client::ApiClient;
use mediabox_core::{ClientConfig, ClientError, PendingUpload};
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

fn api_for(server: &mockito::ServerGuard) -> ApiClient {
    ApiClient::new(ClientConfig::new(server.url()).with_csrf_path("/csrf")).unwrap()
}

#[tokio::test]
async fn test_headers_and_refresh_cookie_are_sent() {
    let mut server = mockito::Server::new_async().await;
    let csrf = server
        .mock("GET", "/csrf")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("set-cookie", "refresh=r1; Path=/; HttpOnly")
        .with_body(r#"{"csrfToken":"tok"}"#)
        .expect(1)
        .create_async()
        .await;
    let logout = server
        .mock("POST", "/auth/logout")
        .match_header("authorization", "Bearer abc")
        .match_header("x-csrf-token", "tok")
        .match_header("cookie", Matcher::Regex("refresh=r1".to_string()))
        .match_body(Matcher::Json(json!({})))
        .with_status(204)
        .create_async()
        .await;

    let api = api_for(&server);
    api.session().set_access_token(Some("abc".to_string()));

    let request = ApiRequest::post("/auth/logout").with_json(&json!({})).unwrap();
    let response = api.request(request).await.unwrap();

    assert_eq!(response.status, 204);
    csrf.assert_async().await;
    logout.assert_async().await;
}

#[tokio::test]
async fn test_feed_query_parameters() {
    let mut server = mockito::Server::new_async().await;
    let feed = server
        .mock("GET", "/media/all/page")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":"1","url":"https://cdn.test/a.png","filename":"a.png"}]"#)
        .create_async()
        .await;

    let api = api_for(&server);
    let items = api
        .list_all_media(PageQuery { page: 2, limit: 5 })
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].src, "https://cdn.test/a.png");
    feed.assert_async().await;
}

#[tokio::test]
async fn test_multipart_upload() {
    let mut server = mockito::Server::new_async().await;
    let _csrf = server
        .mock("GET", "/csrf")
        .with_status(200)
        .with_body(r#"{"csrfToken":"tok"}"#)
        .create_async()
        .await;
    let upload = server
        .mock("POST", "/media/upload/video")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::Regex(r#"name="file"; filename="clip.mp4""#.to_string()))
        .with_status(202)
        .with_body(r#"{"type":"video","videoUuid":"vid-1"}"#)
        .create_async()
        .await;

    let api = api_for(&server);
    let file = PendingUpload::new("clip.mp4", "video/mp4", vec![0u8; 32]).unwrap();
    let outcome = api.upload_media(&file).await.unwrap();

    assert_eq!(outcome.video_job(), Some("vid-1"));
    upload.assert_async().await;
}

#[tokio::test]
async fn test_error_status_is_a_response_not_a_transport_error() {
    let mut server = mockito::Server::new_async().await;
    let _me = server
        .mock("GET", "/auth/me")
        .with_status(404)
        .with_body(r#"{"message":"Not here"}"#)
        .create_async()
        .await;

    let transport = ReqwestTransport::new(&server.url(), Duration::from_secs(5)).unwrap();
    let response = transport.send(&ApiRequest::get("/auth/me")).await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(
        response.into_error(),
        ClientError::Http {
            status: 404,
            message: Some("Not here".to_string()),
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let transport = ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    let err = transport
        .send(&ApiRequest::get("/auth/me"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
}

#[test]
fn test_missing_base_url_is_config_error() {
    let err = ApiClient::new(ClientConfig::default()).unwrap_err();
    assert!(matches!(err, ClientError::Config(ref msg) if msg.contains("MEDIABOX_API_URL")));
}
