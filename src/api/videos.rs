//! Video endpoints
//!
//! Publish and update accept multipart form data; the file fields are
//! streamed into memory with per-kind size caps before any service call.

use axum::extract::{Multipart, Path, Query, State};

use crate::AppState;
use crate::api::dto::{ApiResponse, VideoListParams};
use crate::auth::CurrentUser;
use crate::data::{Page, Video, VideoWithOwner};
use crate::error::AppError;
use crate::service::{
    PublishVideoInput, UpdateVideoInput, UploadedFile, VideoListRequest, VideoService,
};

const MAX_VIDEO_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const SUPPORTED_VIDEO_TYPES: [&str; 2] = ["video/mp4", "video/webm"];
const SUPPORTED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Read one multipart file field into memory, enforcing a size cap.
async fn read_file_field(
    field: &mut axum::extract::multipart::Field<'_>,
    supported_types: &[&str],
    max_size: usize,
) -> Result<UploadedFile, AppError> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            AppError::InvalidArgument("Missing content type for uploaded file".to_string())
        })?;

    if !supported_types.contains(&content_type.as_str()) {
        return Err(AppError::InvalidArgument(format!(
            "Unsupported MIME type: {content_type}"
        )));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::InvalidArgument(format!("Failed to read file: {e}")))?
    {
        if bytes.len() + chunk.len() > max_size {
            return Err(AppError::InvalidArgument(format!(
                "File too large: exceeds {max_size} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        data: bytes,
        content_type,
    })
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidArgument(format!("Failed to read {name}: {e}")))
}

/// GET /api/v1/videos
pub async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(params): Query<VideoListParams>,
) -> Result<ApiResponse<Page<VideoWithOwner>>, AppError> {
    let service = VideoService::new(state.db.clone(), state.storage.clone());
    let page = service
        .list(&VideoListRequest {
            page: params.page,
            limit: params.limit,
            query: params.query,
            sort_by: params.sort_by,
            sort_type: params.sort_type,
            user_id: params.user_id,
        })
        .await?;

    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// POST /api/v1/videos (multipart: title, description, duration, videoFile, thumbnail)
pub async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<ApiResponse<Video>, AppError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut duration: Option<i64> = None;
    let mut video_file: Option<UploadedFile> = None;
    let mut thumbnail: Option<UploadedFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidArgument(format!("Failed to parse multipart: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => title = Some(read_text_field(field, "title").await?),
            "description" => description = Some(read_text_field(field, "description").await?),
            "duration" => {
                let raw = read_text_field(field, "duration").await?;
                duration = Some(raw.trim().parse::<i64>().map_err(|_| {
                    AppError::InvalidArgument("duration must be an integer".to_string())
                })?);
            }
            "videoFile" => {
                video_file = Some(
                    read_file_field(&mut field, &SUPPORTED_VIDEO_TYPES, MAX_VIDEO_UPLOAD_BYTES)
                        .await?,
                );
            }
            "thumbnail" => {
                thumbnail = Some(
                    read_file_field(&mut field, &SUPPORTED_IMAGE_TYPES, MAX_IMAGE_UPLOAD_BYTES)
                        .await?,
                );
            }
            _ => {}
        }
    }

    let input = PublishVideoInput {
        title: title
            .ok_or_else(|| AppError::InvalidArgument("title is required".to_string()))?,
        description: description
            .ok_or_else(|| AppError::InvalidArgument("description is required".to_string()))?,
        duration: duration
            .ok_or_else(|| AppError::InvalidArgument("duration is required".to_string()))?,
        video_file: video_file
            .ok_or_else(|| AppError::InvalidArgument("videoFile is required".to_string()))?,
        thumbnail: thumbnail
            .ok_or_else(|| AppError::InvalidArgument("thumbnail is required".to_string()))?,
    };

    let service = VideoService::new(state.db.clone(), state.storage.clone());
    let video = service.publish(input, &user).await?;

    Ok(ApiResponse::created(video, "Video published successfully"))
}

/// GET /api/v1/videos/:videoId
pub async fn get_video(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoWithOwner>, AppError> {
    let service = VideoService::new(state.db.clone(), state.storage.clone());
    let video = service.get_by_id(&video_id).await?;

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

/// PATCH /api/v1/videos/:videoId (multipart: title, description, thumbnail)
pub async fn update_video(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<ApiResponse<Video>, AppError> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut thumbnail: Option<UploadedFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidArgument(format!("Failed to parse multipart: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "title" => title = Some(read_text_field(field, "title").await?),
            "description" => description = Some(read_text_field(field, "description").await?),
            "thumbnail" => {
                thumbnail = Some(
                    read_file_field(&mut field, &SUPPORTED_IMAGE_TYPES, MAX_IMAGE_UPLOAD_BYTES)
                        .await?,
                );
            }
            _ => {}
        }
    }

    let input = UpdateVideoInput {
        title: title
            .ok_or_else(|| AppError::InvalidArgument("title is required".to_string()))?,
        description: description
            .ok_or_else(|| AppError::InvalidArgument("description is required".to_string()))?,
        thumbnail: thumbnail
            .ok_or_else(|| AppError::InvalidArgument("thumbnail is required".to_string()))?,
    };

    let service = VideoService::new(state.db.clone(), state.storage.clone());
    let video = service.update(&video_id, input).await?;

    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

/// DELETE /api/v1/videos/:videoId
pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    let service = VideoService::new(state.db.clone(), state.storage.clone());
    service.delete(&video_id).await?;

    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Video deleted successfully",
    ))
}

/// PATCH /api/v1/videos/toggle/publish/:videoId
pub async fn toggle_publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, AppError> {
    let service = VideoService::new(state.db.clone(), state.storage.clone());
    let video = service.toggle_publish(&video_id, &user).await?;

    Ok(ApiResponse::ok(video, "Publish state toggled successfully"))
}
