mod common;

use common::TestContext;
use social_service::error::ServiceError;
use social_service::services::{MediaService, MAX_IMAGE_BYTES};
use uuid::Uuid;

#[tokio::test]
async fn test_upload_stores_image_under_uploader() {
    let ctx = TestContext::new();
    let uploader = Uuid::new_v4();

    let upload = ctx
        .state
        .media
        .upload_post_image(uploader, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
        .await
        .unwrap();

    let objects = ctx.images.objects();
    assert_eq!(objects.len(), 1);
    let (key, size, content_type) = &objects[0];
    assert!(key.starts_with(&format!("post-images/{}/", uploader)));
    assert!(key.ends_with(".jpg"));
    assert_eq!(*size, 3);
    assert_eq!(content_type, "image/jpeg");
    assert_eq!(upload.file_url, format!("https://images.test/{}", key));
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let ctx = TestContext::new();
    let err = ctx
        .state
        .media
        .upload_post_image(Uuid::new_v4(), "application/pdf", vec![1, 2, 3])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(ctx.images.objects().is_empty());
}

#[tokio::test]
async fn test_upload_size_limits() {
    let ctx = TestContext::new();

    let err = ctx
        .state
        .media
        .upload_post_image(Uuid::new_v4(), "image/png", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = ctx
        .state
        .media
        .upload_post_image(Uuid::new_v4(), "image/png", vec![0; MAX_IMAGE_BYTES + 1])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    ctx.state
        .media
        .upload_post_image(Uuid::new_v4(), "image/png", vec![0; MAX_IMAGE_BYTES])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_without_store_is_unavailable() {
    let media = MediaService::new(None);
    let err = media
        .upload_post_image(Uuid::new_v4(), "image/png", vec![1])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
}
