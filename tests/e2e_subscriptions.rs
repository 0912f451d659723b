//! E2E tests for subscription operations

mod common;

use common::TestServer;
use serde_json::Value;

#[tokio::test]
async fn test_toggle_round_trip() {
    let server = TestServer::new().await;
    let viewer = server.create_user("viewer").await;
    let token = server.create_token(&viewer).await;
    let channel = server.create_user("creator").await;

    // First toggle subscribes
    let response = server
        .client
        .post(&server.url(&format!("/api/v1/subscriptions/c/{}", channel.id)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["subscribed"], true);

    // Second toggle unsubscribes
    let response = server
        .client
        .post(&server.url(&format!("/api/v1/subscriptions/c/{}", channel.id)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["data"]["subscribed"], false);

    // Subscriber list is back to empty
    let response = server
        .client
        .get(&server.url(&format!("/api/v1/subscriptions/c/{}", channel.id)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    let json: Value = response.json().await.unwrap();
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_listings_project_identities() {
    let server = TestServer::new().await;
    let viewer = server.create_user("viewer").await;
    let token = server.create_token(&viewer).await;
    let channel = server.create_user("creator").await;

    server
        .client
        .post(&server.url(&format!("/api/v1/subscriptions/c/{}", channel.id)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    let response = server
        .client
        .get(&server.url(&format!("/api/v1/subscriptions/c/{}", channel.id)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    let subscribers = json["data"].as_array().unwrap();
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0]["username"], "viewer");
    assert!(subscribers[0].get("id").is_none());

    let response = server
        .client
        .get(&server.url(&format!("/api/v1/subscriptions/u/{}", viewer.id)))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let json: Value = response.json().await.unwrap();
    let channels = json["data"].as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["username"], "creator");
}

#[tokio::test]
async fn test_toggle_unknown_channel_is_404() {
    let server = TestServer::new().await;
    let viewer = server.create_user("viewer").await;
    let token = server.create_token(&viewer).await;

    let response = server
        .client
        .post(&server.url("/api/v1/subscriptions/c/64fa0c2b9d3e4a71c08b5f12"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_toggle_malformed_channel_is_400() {
    let server = TestServer::new().await;
    let viewer = server.create_user("viewer").await;
    let token = server.create_token(&viewer).await;

    let response = server
        .client
        .post(&server.url("/api/v1/subscriptions/c/short"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
