//! SQLite database operations
//!
//! All database access goes through this module. Point lookups use
//! `fetch_optional`; denormalized lookups (owner projections, playlist
//! expansion, subscription lists) are JOIN queries mapped by hand.

use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the SQLite database at `path` and run migrations.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users & sessions
    // =========================================================================

    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        track_query("insert", "users");
        sqlx::query(
            "INSERT INTO users (id, username, email, full_name, avatar, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.avatar)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        track_query("select", "users");
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn user_exists(&self, id: &str) -> Result<bool, AppError> {
        track_query("select", "users");
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    pub async fn insert_session(&self, token: &str, user_id: &str) -> Result<(), AppError> {
        track_query("insert", "sessions");
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Resolve a session token to its user, if the session exists.
    pub async fn get_session_user(&self, token: &str) -> Result<Option<User>, AppError> {
        track_query("select", "sessions");
        let user = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             JOIN sessions s ON s.user_id = u.id
             WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        track_query("insert", "videos");
        sqlx::query(
            "INSERT INTO videos (id, title, description, duration, video_file, thumbnail,
                                 owner_id, is_published, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.duration)
        .bind(&video.video_file)
        .bind(&video.thumbnail)
        .bind(&video.owner_id)
        .bind(video.is_published)
        .bind(video.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        track_query("select", "videos");
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    pub async fn video_exists(&self, id: &str) -> Result<bool, AppError> {
        track_query("select", "videos");
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    pub async fn get_video_with_owner(&self, id: &str) -> Result<Option<VideoWithOwner>, AppError> {
        track_query("select", "videos");
        let row = sqlx::query(&format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS}
             FROM videos v JOIN users u ON u.id = v.owner_id
             WHERE v.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(video_with_owner_from_row).transpose()
    }

    /// Update title, description and thumbnail in one statement.
    ///
    /// Returns the updated record, or `None` if the video does not exist.
    pub async fn update_video_metadata(
        &self,
        id: &str,
        title: &str,
        description: &str,
        thumbnail: &str,
    ) -> Result<Option<Video>, AppError> {
        track_query("update", "videos");
        let result =
            sqlx::query("UPDATE videos SET title = ?, description = ?, thumbnail = ? WHERE id = ?")
                .bind(title)
                .bind(description)
                .bind(thumbnail)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_video(id).await
    }

    /// Set the publish flag; returns false if no row matched.
    pub async fn set_video_published(&self, id: &str, published: bool) -> Result<bool, AppError> {
        track_query("update", "videos");
        let result = sqlx::query("UPDATE videos SET is_published = ? WHERE id = ?")
            .bind(published)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a video; returns false if no row matched.
    pub async fn delete_video(&self, id: &str) -> Result<bool, AppError> {
        track_query("delete", "videos");
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List videos matching the query spec with owner expansion and
    /// pagination metadata.
    pub async fn list_videos(&self, query: &VideoQuery) -> Result<Page<VideoWithOwner>, AppError> {
        track_query("select", "videos");
        let mut count_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM videos v");
        push_video_filters(&mut count_builder, query);
        let total_docs: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS}
             FROM videos v JOIN users u ON u.id = v.owner_id"
        ));
        push_video_filters(&mut builder, query);
        builder.push(format!(
            " ORDER BY {} {}",
            query.sort_field.as_sql(),
            query.sort_direction.as_sql()
        ));
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset());

        let rows = builder.build().fetch_all(&self.pool).await?;
        let docs = rows
            .iter()
            .map(video_with_owner_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(docs, total_docs, query.page, query.limit))
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        track_query("insert", "comments");
        sqlx::query(
            "INSERT INTO comments (id, content, video_id, owner_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.content)
        .bind(&comment.video_id)
        .bind(&comment.owner_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        track_query("select", "comments");
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Replace a comment's content; returns false if no row matched.
    pub async fn update_comment_content(&self, id: &str, content: &str) -> Result<bool, AppError> {
        track_query("update", "comments");
        let result = sqlx::query("UPDATE comments SET content = ? WHERE id = ?")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        track_query("delete", "comments");
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Page of comments for a video in insertion order, each with its
    /// owner projected.
    pub async fn list_comments_for_video(
        &self,
        video_id: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CommentWithOwner>, AppError> {
        track_query("select", "comments");
        let rows = sqlx::query(
            "SELECT c.id, c.content, c.video_id, c.created_at,
                    u.username, u.email, u.full_name, u.avatar
             FROM comments c JOIN users u ON u.id = c.owner_id
             WHERE c.video_id = ?
             ORDER BY c.rowid
             LIMIT ? OFFSET ?",
        )
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CommentWithOwner {
                    id: row.try_get("id")?,
                    content: row.try_get("content")?,
                    video_id: row.try_get("video_id")?,
                    created_at: row.try_get("created_at")?,
                    owner: user_summary_from_row(row)?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(AppError::from)
    }

    // =========================================================================
    // Playlists
    // =========================================================================

    pub async fn insert_playlist(&self, playlist: &Playlist) -> Result<(), AppError> {
        track_query("insert", "playlists");
        sqlx::query(
            "INSERT INTO playlists (id, name, description, owner_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(&playlist.owner_id)
        .bind(playlist.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Option<Playlist>, AppError> {
        track_query("select", "playlists");
        let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(playlist)
    }

    /// Update name and description by id; returns false if absent.
    pub async fn update_playlist_details(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<bool, AppError> {
        track_query("update", "playlists");
        let result = sqlx::query("UPDATE playlists SET name = ?, description = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_playlist(&self, id: &str) -> Result<bool, AppError> {
        track_query("delete", "playlists");
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Append a video to a playlist if not already present.
    ///
    /// Single atomic statement (no fetch-mutate-save); concurrent editors
    /// cannot lose each other's membership changes. Returns false when the
    /// video was already a member.
    pub async fn add_playlist_video(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<bool, AppError> {
        track_query("insert", "playlist_videos");
        let result = sqlx::query(
            "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position)
             SELECT ?, ?, COALESCE(MAX(position) + 1, 0)
             FROM playlist_videos WHERE playlist_id = ?",
        )
        .bind(playlist_id)
        .bind(video_id)
        .bind(playlist_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a video from a playlist; returns the number of removed entries.
    pub async fn remove_playlist_video(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<u64, AppError> {
        track_query("delete", "playlist_videos");
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = ? AND video_id = ?")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// One playlist with owner and member videos expanded.
    pub async fn get_playlist_expanded(
        &self,
        id: &str,
    ) -> Result<Option<PlaylistExpanded>, AppError> {
        let Some(playlist) = self.get_playlist(id).await? else {
            return Ok(None);
        };

        Ok(Some(self.expand_playlist(playlist).await?))
    }

    /// Every playlist owned by a user, expanded.
    pub async fn list_playlists_for_user(
        &self,
        owner_id: &str,
    ) -> Result<Vec<PlaylistExpanded>, AppError> {
        track_query("select", "playlists");
        let playlists = sqlx::query_as::<_, Playlist>(
            "SELECT * FROM playlists WHERE owner_id = ? ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut expanded = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            expanded.push(self.expand_playlist(playlist).await?);
        }

        Ok(expanded)
    }

    async fn expand_playlist(&self, playlist: Playlist) -> Result<PlaylistExpanded, AppError> {
        let owner = sqlx::query_as::<_, UserSummary>(
            "SELECT username, email, full_name, avatar FROM users WHERE id = ?",
        )
        .bind(&playlist.owner_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {VIDEO_WITH_OWNER_COLUMNS}
             FROM playlist_videos pv
             JOIN videos v ON v.id = pv.video_id
             JOIN users u ON u.id = v.owner_id
             WHERE pv.playlist_id = ?
             ORDER BY pv.position"
        ))
        .bind(&playlist.id)
        .fetch_all(&self.pool)
        .await?;

        let videos = rows
            .iter()
            .map(video_with_owner_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PlaylistExpanded {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            created_at: playlist.created_at,
            owner,
            videos,
        })
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Single-result point lookup of a subscription edge.
    pub async fn find_subscription(
        &self,
        subscriber_id: &str,
        channel_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        track_query("select", "subscriptions");
        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Insert a subscription edge.
    ///
    /// A unique-index violation on (subscriber, channel) surfaces as
    /// `Conflict` so the toggle path can treat it as "already subscribed".
    pub async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        track_query("insert", "subscriptions");
        let result = sqlx::query(
            "INSERT INTO subscriptions (id, subscriber_id, channel_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&subscription.id)
        .bind(&subscription.subscriber_id)
        .bind(&subscription.channel_id)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "subscription already exists for this channel".to_string(),
            )),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    pub async fn delete_subscription(&self, id: &str) -> Result<bool, AppError> {
        track_query("delete", "subscriptions");
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Projected identities of everyone subscribed to a channel.
    pub async fn list_channel_subscribers(
        &self,
        channel_id: &str,
    ) -> Result<Vec<UserSummary>, AppError> {
        track_query("select", "subscriptions");
        let subscribers = sqlx::query_as::<_, UserSummary>(
            "SELECT u.username, u.email, u.full_name, u.avatar
             FROM subscriptions s JOIN users u ON u.id = s.subscriber_id
             WHERE s.channel_id = ?
             ORDER BY s.created_at",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscribers)
    }

    /// Projected identities of every channel a user subscribes to.
    pub async fn list_subscribed_channels(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<UserSummary>, AppError> {
        track_query("select", "subscriptions");
        let channels = sqlx::query_as::<_, UserSummary>(
            "SELECT u.username, u.email, u.full_name, u.avatar
             FROM subscriptions s JOIN users u ON u.id = s.channel_id
             WHERE s.subscriber_id = ?
             ORDER BY s.created_at",
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }
}

const VIDEO_WITH_OWNER_COLUMNS: &str = "v.id, v.title, v.description, v.duration, v.video_file, \
     v.thumbnail, v.owner_id, v.is_published, v.created_at, \
     u.username AS owner_username, u.full_name AS owner_full_name, u.avatar AS owner_avatar";

fn track_query(operation: &str, table: &str) {
    crate::metrics::DB_QUERIES_TOTAL
        .with_label_values(&[operation, table])
        .inc();
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_video_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &VideoQuery) {
    let mut has_where = false;

    if let Some(text) = &query.text {
        let pattern = escape_like(text);
        builder.push(" WHERE (v.title LIKE '%' || ");
        builder.push_bind(pattern.clone());
        builder.push(" || '%' ESCAPE '\\' OR v.description LIKE '%' || ");
        builder.push_bind(pattern);
        builder.push(" || '%' ESCAPE '\\')");
        has_where = true;
    }

    if let Some(owner) = &query.owner_id {
        builder.push(if has_where { " AND " } else { " WHERE " });
        builder.push("v.owner_id = ");
        builder.push_bind(owner.as_str().to_string());
    }
}

fn video_with_owner_from_row(row: &SqliteRow) -> Result<VideoWithOwner, AppError> {
    Ok(VideoWithOwner {
        video: Video {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            duration: row.try_get("duration")?,
            video_file: row.try_get("video_file")?,
            thumbnail: row.try_get("thumbnail")?,
            owner_id: row.try_get("owner_id")?,
            is_published: row.try_get("is_published")?,
            created_at: row.try_get("created_at")?,
        },
        owner: VideoOwner {
            username: row.try_get("owner_username")?,
            full_name: row.try_get("owner_full_name")?,
            avatar: row.try_get("owner_avatar")?,
        },
    })
}

fn user_summary_from_row(row: &SqliteRow) -> Result<UserSummary, sqlx::Error> {
    Ok(UserSummary {
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        avatar: row.try_get("avatar")?,
    })
}
