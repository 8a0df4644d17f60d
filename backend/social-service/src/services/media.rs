//! Post image uploads

use crate::domain::ImageUpload;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use s3_utils::S3Client;
use std::sync::Arc;
use uuid::Uuid;

/// Largest accepted post image (4 MiB)
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Object store for uploaded images; returns the public URL
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ServiceResult<String>;
}

pub struct S3ImageStore {
    client: S3Client,
}

impl S3ImageStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn store(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ServiceResult<String> {
        Ok(self.client.upload_object(key, bytes, content_type).await?)
    }
}

/// File extension for an `image/*` subtype
fn extension(mime: &mime::Mime) -> &str {
    match mime.subtype().as_str() {
        "jpeg" | "pjpeg" => "jpg",
        "svg" => "svg",
        "x-icon" | "vnd.microsoft.icon" => "ico",
        other => other,
    }
}

#[derive(Clone)]
pub struct MediaService {
    store: Option<Arc<dyn ImageStore>>,
}

impl MediaService {
    pub fn new(store: Option<Arc<dyn ImageStore>>) -> Self {
        Self { store }
    }

    /// Store one post image for `uploader_id` and return its URL
    pub async fn upload_post_image(
        &self,
        uploader_id: Uuid,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> ServiceResult<ImageUpload> {
        let mime: mime::Mime = content_type
            .parse()
            .map_err(|_| ServiceError::Validation(format!("invalid content type '{}'", content_type)))?;
        if mime.type_() != mime::IMAGE {
            return Err(ServiceError::Validation(format!(
                "only images can be uploaded, got '{}'",
                mime.essence_str()
            )));
        }
        if bytes.is_empty() {
            return Err(ServiceError::Validation("image is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ServiceError::Validation(format!(
                "image exceeds {} bytes",
                MAX_IMAGE_BYTES
            )));
        }

        let store = self
            .store
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("image storage is not configured".to_string()))?;

        let key = format!(
            "post-images/{}/{}.{}",
            uploader_id,
            Uuid::new_v4(),
            extension(&mime)
        );
        let size = bytes.len();
        let file_url = store.store(&key, bytes, mime.essence_str()).await?;

        tracing::info!(uploader_id = %uploader_id, key = %key, size, "Post image stored");

        Ok(ImageUpload { file_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension(&"image/jpeg".parse().unwrap()), "jpg");
        assert_eq!(extension(&"image/png".parse().unwrap()), "png");
        assert_eq!(extension(&"image/webp".parse().unwrap()), "webp");
    }
}
