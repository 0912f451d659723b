//! API layer
//!
//! HTTP handlers for:
//! - Video-sharing REST API (comments, playlists, subscriptions, videos)
//! - Metrics (Prometheus)

mod comments;
mod dto;
pub mod metrics;
mod playlists;
mod subscriptions;
mod videos;

pub use dto::*;

pub use metrics::metrics_router;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::AppState;

/// Create the /api/v1 router
///
/// Every route requires a valid bearer token; authentication is enforced by
/// the `CurrentUser` extractor in each handler.
pub fn api_v1_router() -> Router<AppState> {
    let comment_routes = Router::new()
        .route(
            "/:video_id",
            get(comments::list_comments).post(comments::add_comment),
        )
        .route(
            "/c/:comment_id",
            patch(comments::update_comment).delete(comments::delete_comment),
        );

    let playlist_routes = Router::new()
        .route("/", post(playlists::create_playlist))
        .route("/user/:user_id", get(playlists::list_user_playlists))
        .route(
            "/:playlist_id",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/add/:playlist_id/:video_id",
            patch(playlists::add_video_to_playlist),
        )
        .route(
            "/remove/:playlist_id/:video_id",
            patch(playlists::remove_video_from_playlist),
        );

    let subscription_routes = Router::new()
        .route(
            "/c/:channel_id",
            post(subscriptions::toggle_subscription).get(subscriptions::list_subscribers),
        )
        .route(
            "/u/:subscriber_id",
            get(subscriptions::list_subscribed_channels),
        );

    let video_routes = Router::new()
        .route(
            "/",
            get(videos::list_videos).post(videos::publish_video),
        )
        .route(
            "/:video_id",
            get(videos::get_video)
                .patch(videos::update_video)
                .delete(videos::delete_video),
        )
        .route(
            "/toggle/publish/:video_id",
            patch(videos::toggle_publish),
        )
        // Multipart uploads exceed axum's 2 MB default body limit; the
        // per-field caps in the handlers still apply.
        .layer(axum::extract::DefaultBodyLimit::max(256 * 1024 * 1024));

    Router::new()
        .nest("/comments", comment_routes)
        .nest("/playlists", playlist_routes)
        .nest("/subscriptions", subscription_routes)
        .nest("/videos", video_routes)
}
