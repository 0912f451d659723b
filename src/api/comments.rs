//! Comment endpoints

use axum::Json;
use axum::extract::{Path, Query, State};

use crate::AppState;
use crate::api::dto::{ApiResponse, CreateCommentRequest, PageParams, UpdateCommentRequest};
use crate::auth::CurrentUser;
use crate::data::{Comment, CommentWithOwner};
use crate::error::AppError;
use crate::service::CommentService;

/// GET /api/v1/comments/:videoId
pub async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(video_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Vec<CommentWithOwner>>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comments = service
        .list_for_video(&video_id, params.page, params.limit)
        .await?;

    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

/// POST /api/v1/comments/:videoId
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service.add(&video_id, &req.content, &user).await?;

    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

/// PATCH /api/v1/comments/c/:commentId
pub async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let service = CommentService::new(state.db.clone());
    let comment = service.update(&comment_id, &req.content, &user).await?;

    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// DELETE /api/v1/comments/c/:commentId
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let service = CommentService::new(state.db.clone());
    service.delete(&comment_id, &user).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Comment deleted successfully",
    ))
}
