//! Playlist service
//!
//! CRUD on playlists plus membership operations. Membership uses set
//! semantics: adding a video twice is an informational no-op, and removal
//! of an absent video surfaces as a no-op rather than an error.

use std::sync::Arc;

use crate::data::{Database, EntityId, MembershipChange, Playlist, PlaylistExpanded, User};
use crate::error::AppError;

fn validated_details(name: &str, description: &str) -> Result<(String, String), AppError> {
    let name = name.trim();
    let description = description.trim();
    if name.is_empty() || description.is_empty() {
        return Err(AppError::InvalidArgument(
            "name and description are required".to_string(),
        ));
    }
    Ok((name.to_string(), description.to_string()))
}

/// Playlist service
pub struct PlaylistService {
    db: Arc<Database>,
}

impl PlaylistService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create an empty playlist owned by the caller.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        owner: &User,
    ) -> Result<Playlist, AppError> {
        let (name, description) = validated_details(name, description)?;

        let playlist = Playlist {
            id: EntityId::generate().as_str().to_string(),
            name,
            description,
            owner_id: owner.id.clone(),
            created_at: chrono::Utc::now(),
        };
        self.db.insert_playlist(&playlist).await?;

        tracing::debug!(playlist_id = %playlist.id, "playlist created");

        Ok(playlist)
    }

    /// Every playlist owned by a user, with owner and videos expanded.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PlaylistExpanded>, AppError> {
        let user_id = EntityId::parse(user_id)?;
        self.db.list_playlists_for_user(user_id.as_str()).await
    }

    /// One playlist with the same expansion.
    pub async fn get_by_id(&self, playlist_id: &str) -> Result<PlaylistExpanded, AppError> {
        let playlist_id = EntityId::parse(playlist_id)?;
        self.db
            .get_playlist_expanded(playlist_id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("playlist not found".to_string()))
    }

    /// Append a video to the playlist (idempotent).
    pub async fn add_video(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<MembershipChange, AppError> {
        let playlist_id = EntityId::parse(playlist_id)?;
        let video_id = EntityId::parse(video_id)?;

        if self.db.get_playlist(playlist_id.as_str()).await?.is_none() {
            return Err(AppError::NotFound("playlist not found".to_string()));
        }
        if !self.db.video_exists(video_id.as_str()).await? {
            return Err(AppError::NotFound("video not found".to_string()));
        }

        let added = self
            .db
            .add_playlist_video(playlist_id.as_str(), video_id.as_str())
            .await?;

        Ok(if added {
            MembershipChange::Changed
        } else {
            MembershipChange::NoOp
        })
    }

    /// Remove all entries matching the video from the playlist.
    pub async fn remove_video(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<MembershipChange, AppError> {
        let playlist_id = EntityId::parse(playlist_id)?;
        let video_id = EntityId::parse(video_id)?;

        if self.db.get_playlist(playlist_id.as_str()).await?.is_none() {
            return Err(AppError::NotFound("playlist not found".to_string()));
        }

        let removed = self
            .db
            .remove_playlist_video(playlist_id.as_str(), video_id.as_str())
            .await?;

        Ok(if removed > 0 {
            MembershipChange::Changed
        } else {
            MembershipChange::NoOp
        })
    }

    /// Update name and description, applied by identifier.
    pub async fn update(
        &self,
        playlist_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Playlist, AppError> {
        let playlist_id = EntityId::parse(playlist_id)?;
        let (name, description) = validated_details(name, description)?;

        let updated = self
            .db
            .update_playlist_details(playlist_id.as_str(), &name, &description)
            .await?;
        if !updated {
            return Err(AppError::NotFound("playlist not found".to_string()));
        }

        self.db
            .get_playlist(playlist_id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound("playlist not found".to_string()))
    }

    /// Delete a playlist.
    pub async fn delete(&self, playlist_id: &str) -> Result<(), AppError> {
        let playlist_id = EntityId::parse(playlist_id)?;

        if !self.db.delete_playlist(playlist_id.as_str()).await? {
            return Err(AppError::NotFound("playlist not found".to_string()));
        }

        Ok(())
    }
}
