//! Subscription endpoints

use axum::extract::{Path, State};

use crate::AppState;
use crate::api::dto::ApiResponse;
use crate::auth::CurrentUser;
use crate::data::UserSummary;
use crate::error::AppError;
use crate::service::{SubscriptionService, SubscriptionToggle};

/// POST /api/v1/subscriptions/c/:channelId
pub async fn toggle_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let service = SubscriptionService::new(state.db.clone());

    match service.toggle(&user, &channel_id).await? {
        SubscriptionToggle::Subscribed(edge) => Ok(ApiResponse::ok(
            serde_json::json!({ "subscribed": true, "subscription": edge }),
            "Subscribed successfully",
        )),
        SubscriptionToggle::Unsubscribed => Ok(ApiResponse::ok(
            serde_json::json!({ "subscribed": false }),
            "Unsubscribed successfully",
        )),
    }
}

/// GET /api/v1/subscriptions/c/:channelId
pub async fn list_subscribers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<UserSummary>>, AppError> {
    let service = SubscriptionService::new(state.db.clone());
    let subscribers = service.list_subscribers(&channel_id).await?;

    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

/// GET /api/v1/subscriptions/u/:subscriberId
pub async fn list_subscribed_channels(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<UserSummary>>, AppError> {
    let service = SubscriptionService::new(state.db.clone());
    let channels = service.list_subscribed_channels(&subscriber_id).await?;

    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
