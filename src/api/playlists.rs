//! Playlist endpoints

use axum::Json;
use axum::extract::{Path, State};

use crate::AppState;
use crate::api::dto::{ApiResponse, CreatePlaylistRequest, UpdatePlaylistRequest};
use crate::auth::CurrentUser;
use crate::data::{MembershipChange, Playlist, PlaylistExpanded};
use crate::error::AppError;
use crate::service::PlaylistService;

/// POST /api/v1/playlists
pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let service = PlaylistService::new(state.db.clone());
    let playlist = service.create(&req.name, &req.description, &user).await?;

    Ok(ApiResponse::created(
        playlist,
        "Playlist created successfully",
    ))
}

/// GET /api/v1/playlists/user/:userId
pub async fn list_user_playlists(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<PlaylistExpanded>>, AppError> {
    let service = PlaylistService::new(state.db.clone());
    let playlists = service.list_for_user(&user_id).await?;

    Ok(ApiResponse::ok(
        playlists,
        "User playlists fetched successfully",
    ))
}

/// GET /api/v1/playlists/:playlistId
pub async fn get_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<PlaylistExpanded>, AppError> {
    let service = PlaylistService::new(state.db.clone());
    let playlist = service.get_by_id(&playlist_id).await?;

    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

/// PATCH /api/v1/playlists/:playlistId
pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(playlist_id): Path<String>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> Result<ApiResponse<Playlist>, AppError> {
    let service = PlaylistService::new(state.db.clone());
    let playlist = service
        .update(&playlist_id, &req.name, &req.description)
        .await?;

    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

/// DELETE /api/v1/playlists/:playlistId
pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let service = PlaylistService::new(state.db.clone());
    service.delete(&playlist_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Playlist deleted successfully",
    ))
}

/// PATCH /api/v1/playlists/add/:playlistId/:videoId
pub async fn add_video_to_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let service = PlaylistService::new(state.db.clone());
    let change = service.add_video(&playlist_id, &video_id).await?;

    let message = match change {
        MembershipChange::Changed => "Video added to playlist",
        MembershipChange::NoOp => "Video already in playlist",
    };
    Ok(ApiResponse::ok(serde_json::json!({}), message))
}

/// PATCH /api/v1/playlists/remove/:playlistId/:videoId
pub async fn remove_video_from_playlist(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let service = PlaylistService::new(state.db.clone());
    let change = service.remove_video(&playlist_id, &video_id).await?;

    let message = match change {
        MembershipChange::Changed => "Video removed from playlist",
        MembershipChange::NoOp => "Video was not in playlist",
    };
    Ok(ApiResponse::ok(serde_json::json!({}), message))
}
