//! Video service
//!
//! CRUD on video metadata, publish-state toggle and paginated listing.
//! Media persistence is delegated to the upload collaborator; a video row
//! is only written once both uploads have returned durable URLs.

use std::sync::Arc;

use crate::data::{
    Database, EntityId, Page, SortDirection, User, Video, VideoQuery, VideoSortField,
    VideoWithOwner,
};
use crate::error::AppError;
use crate::storage::{MediaKind, MediaStore};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

/// A file received from the caller, not yet uploaded.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Input for publishing a new video.
#[derive(Debug, Clone)]
pub struct PublishVideoInput {
    pub title: String,
    pub description: String,
    /// Duration in seconds
    pub duration: i64,
    pub video_file: UploadedFile,
    pub thumbnail: UploadedFile,
}

/// Input for updating video metadata.
#[derive(Debug, Clone)]
pub struct UpdateVideoInput {
    pub title: String,
    pub description: String,
    pub thumbnail: UploadedFile,
}

/// Raw listing parameters as they arrive from the query string.
#[derive(Debug, Clone, Default)]
pub struct VideoListRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

fn validated_page(value: Option<i64>, name: &str, default: i64) -> Result<i64, AppError> {
    match value {
        None => Ok(default),
        Some(v) if v > 0 => Ok(v),
        Some(v) => Err(AppError::InvalidArgument(format!(
            "{name} must be positive, got {v}"
        ))),
    }
}

fn parse_sort_field(raw: Option<&str>) -> Result<VideoSortField, AppError> {
    match raw {
        None => Ok(VideoSortField::CreatedAt),
        Some("createdAt") => Ok(VideoSortField::CreatedAt),
        Some("title") => Ok(VideoSortField::Title),
        Some("duration") => Ok(VideoSortField::Duration),
        Some(other) => Err(AppError::InvalidArgument(format!(
            "unsupported sort field: {other}"
        ))),
    }
}

fn parse_sort_direction(raw: Option<&str>) -> Result<SortDirection, AppError> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        // Default: newest first
        None => Ok(SortDirection::Descending),
        Some("asc") => Ok(SortDirection::Ascending),
        Some("desc") => Ok(SortDirection::Descending),
        Some(other) => Err(AppError::InvalidArgument(format!(
            "sort direction must be asc or desc, got {other}"
        ))),
    }
}

/// Video service
pub struct VideoService {
    db: Arc<Database>,
    storage: Arc<dyn MediaStore>,
}

impl VideoService {
    pub fn new(db: Arc<Database>, storage: Arc<dyn MediaStore>) -> Self {
        Self { db, storage }
    }

    /// Paginated, owner-expanded listing.
    ///
    /// A malformed owner filter is rejected rather than silently dropped.
    pub async fn list(&self, request: &VideoListRequest) -> Result<Page<VideoWithOwner>, AppError> {
        let page = validated_page(request.page, "page", DEFAULT_PAGE)?;
        let limit = validated_page(request.limit, "limit", DEFAULT_LIMIT)?;
        let sort_field = parse_sort_field(request.sort_by.as_deref())?;
        let sort_direction = parse_sort_direction(request.sort_type.as_deref())?;

        let owner_id = request
            .user_id
            .as_deref()
            .map(EntityId::parse)
            .transpose()?;

        let text = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(ToOwned::to_owned);

        let query = VideoQuery {
            text,
            owner_id,
            sort_field,
            sort_direction,
            page,
            limit,
        };

        self.db.list_videos(&query).await
    }

    /// Upload media and store a new unpublished video owned by the caller.
    ///
    /// Both uploads must succeed before anything is persisted; a URL from a
    /// failed upload never reaches the store.
    pub async fn publish(
        &self,
        input: PublishVideoInput,
        owner: &User,
    ) -> Result<Video, AppError> {
        let title = input.title.trim();
        let description = input.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(AppError::InvalidArgument(
                "title and description are required".to_string(),
            ));
        }
        if input.duration <= 0 {
            return Err(AppError::InvalidArgument(
                "duration must be positive".to_string(),
            ));
        }
        if input.video_file.data.is_empty() || input.thumbnail.data.is_empty() {
            return Err(AppError::InvalidArgument(
                "video file and thumbnail are required".to_string(),
            ));
        }

        let video_url = self
            .storage
            .upload(
                MediaKind::Video,
                input.video_file.data,
                &input.video_file.content_type,
            )
            .await?;
        let thumbnail_url = self
            .storage
            .upload(
                MediaKind::Thumbnail,
                input.thumbnail.data,
                &input.thumbnail.content_type,
            )
            .await?;

        let video = Video {
            id: EntityId::generate().as_str().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            duration: input.duration,
            video_file: video_url,
            thumbnail: thumbnail_url,
            owner_id: owner.id.clone(),
            is_published: false,
            created_at: chrono::Utc::now(),
        };
        self.db.insert_video(&video).await?;

        tracing::info!(video_id = %video.id, owner = %owner.username, "video published");

        Ok(video)
    }

    /// Video with owner projected to username/fullName/avatar.
    pub async fn get_by_id(&self, video_id: &str) -> Result<VideoWithOwner, AppError> {
        let video_id = EntityId::parse(video_id)?;
        self.db
            .get_video_with_owner(video_id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("video not found".to_string()))
    }

    /// Replace title, description and thumbnail.
    ///
    /// Validation happens before the thumbnail upload and before any store
    /// write; a failed upload leaves the record untouched.
    pub async fn update(
        &self,
        video_id: &str,
        input: UpdateVideoInput,
    ) -> Result<Video, AppError> {
        let video_id = EntityId::parse(video_id)?;

        let title = input.title.trim();
        let description = input.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(AppError::InvalidArgument(
                "title and description are required".to_string(),
            ));
        }
        if input.thumbnail.data.is_empty() {
            return Err(AppError::InvalidArgument(
                "thumbnail is required".to_string(),
            ));
        }

        if !self.db.video_exists(video_id.as_str()).await? {
            return Err(AppError::NotFound("video not found".to_string()));
        }

        let thumbnail_url = self
            .storage
            .upload(
                MediaKind::Thumbnail,
                input.thumbnail.data,
                &input.thumbnail.content_type,
            )
            .await?;

        self.db
            .update_video_metadata(video_id.as_str(), title, description, &thumbnail_url)
            .await?
            .ok_or_else(|| AppError::NotFound("video not found".to_string()))
    }

    /// Delete a video. Its comments are deliberately left in place.
    pub async fn delete(&self, video_id: &str) -> Result<(), AppError> {
        let video_id = EntityId::parse(video_id)?;

        if !self.db.delete_video(video_id.as_str()).await? {
            return Err(AppError::NotFound("video not found".to_string()));
        }

        Ok(())
    }

    /// Flip the publish state. Owner-only.
    pub async fn toggle_publish(&self, video_id: &str, caller: &User) -> Result<Video, AppError> {
        let video_id = EntityId::parse(video_id)?;

        let video = self
            .db
            .get_video(video_id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("video not found".to_string()))?;

        if video.owner_id != caller.id {
            return Err(AppError::PermissionDenied(
                "only the owner may change the publish state".to_string(),
            ));
        }

        // The video can vanish between the ownership check and the write; a
        // zero-row update must not be reported as applied.
        let flipped = !video.is_published;
        if !self
            .db
            .set_video_published(video_id.as_str(), flipped)
            .await?
        {
            return Err(AppError::NotFound("video not found".to_string()));
        }

        Ok(Video {
            is_published: flipped,
            ..video
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockMediaStore;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn setup_db() -> (Arc<Database>, User, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );

        let user = User {
            id: EntityId::generate().as_str().to_string(),
            username: "uploader".to_string(),
            email: "uploader@example.com".to_string(),
            full_name: "Uma Uploader".to_string(),
            avatar: String::new(),
            created_at: Utc::now(),
        };
        db.insert_user(&user).await.unwrap();

        (db, user, temp_dir)
    }

    fn publish_input() -> PublishVideoInput {
        PublishVideoInput {
            title: "T".to_string(),
            description: "D".to_string(),
            duration: 120,
            video_file: UploadedFile {
                data: vec![1, 2, 3],
                content_type: "video/mp4".to_string(),
            },
            thumbnail: UploadedFile {
                data: vec![4, 5],
                content_type: "image/webp".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn publish_stores_returned_urls_and_defaults_unpublished() {
        let (db, user, _tmp) = setup_db().await;

        let mut storage = MockMediaStore::new();
        storage
            .expect_upload()
            .returning(|kind, _data, _ct| match kind {
                MediaKind::Video => Ok("https://media.example.com/videos/f.mp4".to_string()),
                MediaKind::Thumbnail => {
                    Ok("https://media.example.com/thumbnails/t2.webp".to_string())
                }
            });

        let service = VideoService::new(db.clone(), Arc::new(storage));
        let video = service.publish(publish_input(), &user).await.unwrap();

        assert!(!video.is_published);
        assert_eq!(video.owner_id, user.id);
        assert_eq!(video.video_file, "https://media.example.com/videos/f.mp4");
        assert_eq!(
            video.thumbnail,
            "https://media.example.com/thumbnails/t2.webp"
        );
        assert!(db.get_video(&video.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn publish_validates_before_uploading() {
        let (db, user, _tmp) = setup_db().await;

        // No upload expectation: reaching the collaborator would panic
        let storage = MockMediaStore::new();
        let service = VideoService::new(db, Arc::new(storage));

        let mut input = publish_input();
        input.title = "  ".to_string();
        let error = service.publish(input, &user).await.unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));

        let mut input = publish_input();
        input.duration = 0;
        let error = service.publish(input, &user).await.unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn publish_does_not_persist_on_upload_failure() {
        let (db, user, _tmp) = setup_db().await;

        let mut storage = MockMediaStore::new();
        storage
            .expect_upload()
            .returning(|_, _, _| Err(AppError::Storage("bucket unavailable".to_string())));

        let service = VideoService::new(db.clone(), Arc::new(storage));
        let error = service.publish(publish_input(), &user).await.unwrap_err();
        assert!(matches!(error, AppError::Storage(_)));

        let page = db
            .list_videos(&VideoQuery {
                text: None,
                owner_id: None,
                sort_field: VideoSortField::CreatedAt,
                sort_direction: SortDirection::Descending,
                page: 1,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.total_docs, 0);
    }

    #[tokio::test]
    async fn update_with_empty_title_performs_no_write() {
        let (db, user, _tmp) = setup_db().await;

        let mut storage = MockMediaStore::new();
        storage
            .expect_upload()
            .returning(|_, _, _| Ok("https://media.example.com/videos/f.mp4".to_string()));
        let service = VideoService::new(db.clone(), Arc::new(storage));

        let video = service.publish(publish_input(), &user).await.unwrap();

        let error = service
            .update(
                &video.id,
                UpdateVideoInput {
                    title: "".to_string(),
                    description: "D".to_string(),
                    thumbnail: UploadedFile {
                        data: vec![1],
                        content_type: "image/webp".to_string(),
                    },
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));

        let stored = db.get_video(&video.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "T");
    }

    #[tokio::test]
    async fn toggle_publish_is_owner_only() {
        let (db, user, _tmp) = setup_db().await;

        let mut storage = MockMediaStore::new();
        storage
            .expect_upload()
            .returning(|_, _, _| Ok("https://media.example.com/videos/f.mp4".to_string()));
        let service = VideoService::new(db.clone(), Arc::new(storage));

        let video = service.publish(publish_input(), &user).await.unwrap();

        let stranger = User {
            id: EntityId::generate().as_str().to_string(),
            username: "stranger".to_string(),
            email: "stranger@example.com".to_string(),
            full_name: "Someone Else".to_string(),
            avatar: String::new(),
            created_at: Utc::now(),
        };
        db.insert_user(&stranger).await.unwrap();

        let error = service
            .toggle_publish(&video.id, &stranger)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::PermissionDenied(_)));
        assert!(!db.get_video(&video.id).await.unwrap().unwrap().is_published);

        let toggled = service.toggle_publish(&video.id, &user).await.unwrap();
        assert!(toggled.is_published);
    }

    #[tokio::test]
    async fn list_rejects_malformed_owner_filter() {
        let (db, _user, _tmp) = setup_db().await;
        let service = VideoService::new(db, Arc::new(MockMediaStore::new()));

        let error = service
            .list(&VideoListRequest {
                user_id: Some("not-a-valid-id".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn list_rejects_unknown_sort_field() {
        let (db, _user, _tmp) = setup_db().await;
        let service = VideoService::new(db, Arc::new(MockMediaStore::new()));

        let error = service
            .list(&VideoListRequest {
                sort_by: Some("views".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));
    }
}
