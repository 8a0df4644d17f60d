mod common;

use actix_middleware::Principal;
use common::{subject_for, TestContext};
use social_service::error::ServiceError;
use social_service::services::DirectoryProfile;

#[tokio::test]
async fn test_sync_creates_user_from_directory() {
    let ctx = TestContext::new();
    ctx.directory.register(
        "user_2xyz",
        DirectoryProfile {
            first_name: Some("Grace".into()),
            last_name: Some("Hopper".into()),
            username: None,
            primary_email: Some("grace@navy.mil".into()),
            image_url: Some("https://img.test/grace.png".into()),
        },
    );

    let user = ctx
        .state
        .identity
        .sync_identity(&Principal::new("user_2xyz"))
        .await
        .unwrap();
    assert_eq!(user.external_id, "user_2xyz");
    assert_eq!(user.handle, "grace");
    assert_eq!(user.name.as_deref(), Some("Grace Hopper"));
    assert_eq!(user.email.as_deref(), Some("grace@navy.mil"));
    assert_eq!(user.image.as_deref(), Some("https://img.test/grace.png"));
    assert!(user.websites.is_empty());
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let ctx = TestContext::new();
    let first = ctx.sign_up("alice").await;
    let principal = Principal::new(subject_for("alice"));

    let second = ctx.state.identity.sync_identity(&principal).await.unwrap();
    assert_eq!(first.id, second.id);
    // the second sync never asked the directory
    assert_eq!(ctx.directory.lookups(), 1);
}

#[tokio::test]
async fn test_concurrent_sync_yields_one_user() {
    let ctx = TestContext::new();
    ctx.directory.register(
        "user_race",
        DirectoryProfile {
            username: Some("racer".into()),
            ..Default::default()
        },
    );
    let principal = Principal::new("user_race");

    let (a, b) = tokio::join!(
        ctx.state.identity.sync_identity(&principal),
        ctx.state.identity.sync_identity(&principal)
    );
    assert_eq!(a.unwrap().id, b.unwrap().id);
}

#[tokio::test]
async fn test_handle_taken_by_other_account() {
    let ctx = TestContext::new();
    ctx.sign_up("alice").await;
    ctx.directory.register(
        "user_other",
        DirectoryProfile {
            username: Some("alice".into()),
            ..Default::default()
        },
    );

    let err = ctx
        .state
        .identity
        .sync_identity(&Principal::new("user_other"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_unknown_directory_subject() {
    let ctx = TestContext::new();
    let err = ctx
        .state
        .identity
        .sync_identity(&Principal::new("user_ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_resolve_current_user() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let identity = &ctx.state.identity;

    assert_eq!(identity.resolve_current_user(None).await.unwrap(), None);

    let principal = Principal::new(subject_for("alice"));
    assert_eq!(
        identity.resolve_current_user(Some(&principal)).await.unwrap(),
        Some(alice.id)
    );

    let unsynced = Principal::new("user_unsynced");
    let err = identity
        .resolve_current_user(Some(&unsynced))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(identity.viewer(Some(&unsynced)).await.unwrap(), None);

    let err = identity.require_current_user(None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unauthenticated(_)));
}
