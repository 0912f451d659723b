//! S3-compatible media storage
//!
//! Handles upload and URL generation for video files and thumbnails.
//! Files are served via a public URL base (CDN / custom domain).

use aws_sdk_s3::Client as S3Client;

use crate::error::AppError;
use crate::metrics::MEDIA_UPLOADS_TOTAL;

/// Kind hint for an upload; selects the key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Thumbnail,
}

impl MediaKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Video => "videos",
            Self::Thumbnail => "thumbnails",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
        }
    }
}

/// Upload collaborator seam.
///
/// The production implementation talks to an S3-compatible bucket; tests
/// substitute a double so no network is involved.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a media file and return its durable public URL.
    async fn upload(
        &self,
        kind: MediaKind,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;
}

/// Media storage backed by an S3-compatible bucket.
pub struct S3MediaStore {
    client: S3Client,
    /// Media bucket name
    bucket: String,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

impl S3MediaStore {
    /// Create new media storage client
    ///
    /// # Errors
    /// Returns error if S3 client initialization fails
    pub fn new(
        storage: &crate::config::StorageConfig,
        s3: &crate::config::S3Config,
    ) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let credentials = Credentials::new(
            &s3.access_key_id,
            &s3.secret_access_key,
            None,
            None,
            "vidstream-s3",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(s3.region.clone()))
            .endpoint_url(&s3.endpoint)
            .credentials_provider(credentials)
            .http_client(super::build_s3_http_client())
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: storage.bucket.clone(),
            public_url: storage.public_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

fn file_extension_from_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        _ => "bin",
    }
}

#[async_trait::async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(
        &self,
        kind: MediaKind,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let ext = file_extension_from_content_type(content_type);
        let key = format!(
            "{}/{}.{}",
            kind.prefix(),
            crate::data::EntityId::generate(),
            ext
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload failed: {}", e)))?;

        MEDIA_UPLOADS_TOTAL.with_label_values(&[kind.as_str()]).inc();

        Ok(self.get_public_url(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping_falls_back_to_bin() {
        assert_eq!(file_extension_from_content_type("video/mp4"), "mp4");
        assert_eq!(file_extension_from_content_type("image/webp"), "webp");
        assert_eq!(file_extension_from_content_type("application/zip"), "bin");
    }

    #[test]
    fn kind_prefixes_are_distinct() {
        assert_ne!(MediaKind::Video.prefix(), MediaKind::Thumbnail.prefix());
    }
}
