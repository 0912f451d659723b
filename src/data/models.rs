//! Data models
//!
//! Rust structs representing database entities, joined projections returned
//! by lookup queries, and the explicit query specs the handlers build.
//! JSON field names follow the API convention (camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// =============================================================================
// ID Type
// =============================================================================

/// Entity ID wrapper (24 lowercase hex characters)
///
/// Example: "64fa0c2b9d3e4a71c08b5f12"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a new random ID (12 random bytes, hex encoded)
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse an ID from its canonical string form.
    ///
    /// Malformed ids are rejected here, before any query is issued.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.len() != 24 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::InvalidArgument(format!(
                "malformed id: {raw:?} (expected 24 hex characters)"
            )));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Users
// =============================================================================

/// A registered user; referenced as owner, subscriber and channel elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

/// Projected owner/subscriber identity attached to denormalized lookups.
///
/// Never carries more than these four fields; the full user record stays
/// internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
}

/// Owner projection used on video payloads (no email).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwner {
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

// =============================================================================
// Videos
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Duration in seconds, always > 0
    pub duration: i64,
    /// Durable URL returned by the upload collaborator
    pub video_file: String,
    /// Durable thumbnail URL
    pub thumbnail: String,
    pub owner_id: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Video with its owner expanded to a projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: Video,
    pub owner: VideoOwner,
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Comment annotated with a projected owner for listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithOwner {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub created_at: DateTime<Utc>,
    pub owner: UserSummary,
}

// =============================================================================
// Playlists
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Playlist with owner and member videos expanded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistExpanded {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub owner: UserSummary,
    /// Members in insertion order, each with its own owner expanded
    pub videos: Vec<VideoWithOwner>,
}

/// Outcome of a playlist membership mutation.
///
/// A no-op is an informational result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Changed,
    NoOp,
}

// =============================================================================
// Subscriptions
// =============================================================================

/// A subscriber -> channel edge; at most one per pair, enforced by a unique
/// index in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Query specs
// =============================================================================

/// Sort direction for listing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Sortable video fields (allow-list, never interpolated from raw input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSortField {
    CreatedAt,
    Title,
    Duration,
}

impl VideoSortField {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Title => "v.title",
            Self::Duration => "v.duration",
        }
    }
}

/// Filter, sort and pagination spec for video listing.
///
/// Built by the handler from validated query parameters; the data layer
/// translates it into a single SQL statement.
#[derive(Debug, Clone)]
pub struct VideoQuery {
    /// Case-insensitive substring match over title and description
    pub text: Option<String>,
    /// Owner equality filter
    pub owner_id: Option<EntityId>,
    pub sort_field: VideoSortField,
    pub sort_direction: SortDirection,
    /// 1-based page number, always >= 1
    pub page: i64,
    /// Page size, always >= 1
    pub limit: i64,
}

impl VideoQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// A page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total_docs == 0 {
            0
        } else {
            (total_docs + limit - 1) / limit
        };
        Self {
            docs,
            total_docs,
            total_pages,
            page,
            limit,
        }
    }
}
