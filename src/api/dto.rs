//! Response envelope and request DTOs
//!
//! Every success response is wrapped in the same envelope:
//! `{ statusCode, data, message, success }` with `success = statusCode < 400`.
//! The error half of the envelope lives in `error.rs`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Success envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    /// 200 envelope
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// 201 envelope
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: String,
    pub description: String,
}

/// Pagination query parameters for comment listing
#[derive(Debug, Deserialize, Default)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query parameters for video listing
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Free-text filter over title and description
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_camel_case() {
        let envelope = ApiResponse::ok(serde_json::json!({"id": "x"}), "fetched");
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "fetched");
        assert_eq!(value["data"]["id"], "x");
    }

    #[test]
    fn created_envelope_reports_201() {
        let envelope = ApiResponse::created((), "created");
        assert_eq!(envelope.status_code, 201);
        assert!(envelope.success);
    }
}
