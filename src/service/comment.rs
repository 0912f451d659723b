//! Comment service
//!
//! CRUD on comments attached to a video. Update and delete are author-only.

use std::sync::Arc;

use crate::data::{Comment, CommentWithOwner, Database, EntityId, User};
use crate::error::AppError;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

fn validated_content(content: &str) -> Result<String, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArgument(
            "comment content must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
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

/// Comment service
pub struct CommentService {
    db: Arc<Database>,
}

impl CommentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Page of comments for a video, each annotated with a projected owner.
    ///
    /// Page/limit default to 1/10; non-positive values are rejected rather
    /// than clamped.
    pub async fn list_for_video(
        &self,
        video_id: &str,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<CommentWithOwner>, AppError> {
        let video_id = EntityId::parse(video_id)?;
        let page = validated_page(page, "page", DEFAULT_PAGE)?;
        let limit = validated_page(limit, "limit", DEFAULT_LIMIT)?;

        if !self.db.video_exists(video_id.as_str()).await? {
            return Err(AppError::NotFound("video not found".to_string()));
        }

        self.db
            .list_comments_for_video(video_id.as_str(), (page - 1) * limit, limit)
            .await
    }

    /// Add a comment owned by the caller.
    pub async fn add(
        &self,
        video_id: &str,
        content: &str,
        author: &User,
    ) -> Result<Comment, AppError> {
        let video_id = EntityId::parse(video_id)?;
        let content = validated_content(content)?;

        if !self.db.video_exists(video_id.as_str()).await? {
            return Err(AppError::NotFound("video not found".to_string()));
        }

        let comment = Comment {
            id: EntityId::generate().as_str().to_string(),
            content,
            video_id: video_id.as_str().to_string(),
            owner_id: author.id.clone(),
            created_at: chrono::Utc::now(),
        };
        self.db.insert_comment(&comment).await?;

        tracing::debug!(comment_id = %comment.id, video_id = %comment.video_id, "comment added");

        Ok(comment)
    }

    /// Update a comment's content. Only the author may update it.
    pub async fn update(
        &self,
        comment_id: &str,
        content: &str,
        caller: &User,
    ) -> Result<Comment, AppError> {
        let comment_id = EntityId::parse(comment_id)?;
        let content = validated_content(content)?;

        let comment = self
            .db
            .get_comment(comment_id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("comment not found".to_string()))?;

        if comment.owner_id != caller.id {
            return Err(AppError::PermissionDenied(
                "only the author may update this comment".to_string(),
            ));
        }

        // The comment can vanish between the ownership check and the write;
        // a zero-row update must not be reported as applied.
        if !self
            .db
            .update_comment_content(comment_id.as_str(), &content)
            .await?
        {
            return Err(AppError::NotFound("comment not found".to_string()));
        }

        Ok(Comment { content, ..comment })
    }

    /// Delete a comment. Only the author may delete it.
    pub async fn delete(&self, comment_id: &str, caller: &User) -> Result<(), AppError> {
        let comment_id = EntityId::parse(comment_id)?;

        let comment = self
            .db
            .get_comment(comment_id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("comment not found".to_string()))?;

        if comment.owner_id != caller.id {
            return Err(AppError::PermissionDenied(
                "only the author may delete this comment".to_string(),
            ));
        }

        self.db.delete_comment(comment_id.as_str()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Video;
    use chrono::Utc;
    use tempfile::TempDir;

    async fn setup() -> (CommentService, Arc<Database>, User, Video, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );

        let user = User {
            id: EntityId::generate().as_str().to_string(),
            username: "author".to_string(),
            email: "author@example.com".to_string(),
            full_name: "Author Person".to_string(),
            avatar: String::new(),
            created_at: Utc::now(),
        };
        db.insert_user(&user).await.unwrap();

        let video = Video {
            id: EntityId::generate().as_str().to_string(),
            title: "Video".to_string(),
            description: "Description".to_string(),
            duration: 60,
            video_file: "https://media.example.com/videos/v.mp4".to_string(),
            thumbnail: "https://media.example.com/thumbnails/t.webp".to_string(),
            owner_id: user.id.clone(),
            is_published: true,
            created_at: Utc::now(),
        };
        db.insert_video(&video).await.unwrap();

        (CommentService::new(db.clone()), db, user, video, temp_dir)
    }

    fn other_user() -> User {
        User {
            id: EntityId::generate().as_str().to_string(),
            username: "stranger".to_string(),
            email: "stranger@example.com".to_string(),
            full_name: "Someone Else".to_string(),
            avatar: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn add_rejects_whitespace_content() {
        let (service, _db, user, video, _tmp) = setup().await;

        let error = service.add(&video.id, "   ", &user).await.unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn add_fails_for_missing_video() {
        let (service, _db, user, _video, _tmp) = setup().await;

        let error = service
            .add("64fa0c2b9d3e4a71c08b5f12", "hello", &user)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn add_then_list_projects_owner_fields_only() {
        let (service, _db, user, video, _tmp) = setup().await;

        service.add(&video.id, "  first!  ", &user).await.unwrap();
        let comments = service.list_for_video(&video.id, None, None).await.unwrap();

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "first!");
        assert_eq!(comments[0].owner.username, "author");
        // Projection carries exactly the four public fields
        let owner_json = serde_json::to_value(&comments[0].owner).unwrap();
        let keys: Vec<_> = owner_json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 4);
        assert!(!keys.iter().any(|k| k.contains("password") || k == "id"));
    }

    #[tokio::test]
    async fn list_rejects_non_positive_page() {
        let (service, _db, _user, video, _tmp) = setup().await;

        let error = service
            .list_for_video(&video.id, Some(0), None)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));

        let error = service
            .list_for_video(&video.id, None, Some(-5))
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn update_is_author_only() {
        let (service, db, user, video, _tmp) = setup().await;

        let comment = service.add(&video.id, "mine", &user).await.unwrap();

        let stranger = other_user();
        db.insert_user(&stranger).await.unwrap();

        let error = service
            .update(&comment.id, "hijacked", &stranger)
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::PermissionDenied(_)));

        let updated = service.update(&comment.id, "edited", &user).await.unwrap();
        assert_eq!(updated.content, "edited");
    }

    #[tokio::test]
    async fn delete_twice_yields_not_found() {
        let (service, _db, user, video, _tmp) = setup().await;

        let comment = service.add(&video.id, "bye", &user).await.unwrap();
        service.delete(&comment.id, &user).await.unwrap();

        let error = service.delete(&comment.id, &user).await.unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }
}
