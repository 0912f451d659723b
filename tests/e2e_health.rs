//! E2E tests for the health and metrics endpoints

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let server = TestServer::new().await;

    // Drive requests through the instrumented router first
    server
        .client
        .get(&server.url("/health"))
        .send()
        .await
        .unwrap();
    let user = server.create_user("metrics_user").await;
    let token = server.create_token(&user).await;
    server
        .client
        .get(&server.url("/api/v1/videos"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(&server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("# TYPE vidstream_http_requests_total"));
    assert!(body.contains("vidstream_http_request_duration_seconds"));
    assert!(body.contains("vidstream_db_queries_total"));
    // Endpoint labels are route templates, never raw ids
    assert!(body.contains("endpoint=\"/health\""));
    assert!(body.contains("endpoint=\"/api/v1/videos\""));
}

#[tokio::test]
async fn test_every_route_is_counted() {
    let server = TestServer::new().await;

    let user = server.create_user("counted_user").await;
    let token = server.create_token(&user).await;
    let video = server.create_video(&user, "Counted").await;

    server
        .client
        .get(&server.url(&format!("/api/v1/comments/{}", video.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    server
        .client
        .get(&server.url(&format!("/api/v1/subscriptions/c/{}", user.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let body = server
        .client
        .get(&server.url("/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("endpoint=\"/api/v1/comments/:video_id\""));
    assert!(body.contains("endpoint=\"/api/v1/subscriptions/c/:channel_id\""));
}

#[tokio::test]
async fn test_api_requires_authentication() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(&server.url("/api/v1/videos"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["statusCode"], 401);
    assert_eq!(json["success"], false);
}
