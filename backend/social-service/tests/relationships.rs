mod common;

use async_trait::async_trait;
use cache_invalidation::StaleView;
use common::TestContext;
use social_service::domain::{NewNotification, Notification, NotificationKind};
use social_service::error::{ServiceError, ServiceResult};
use social_service::repository::{FollowRepository, LikeRepository};
use social_service::services::RelationshipService;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_follow_toggle_round_trip() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;
    ctx.invalidator.take();

    let result = ctx
        .state
        .relationships
        .toggle_follow(alice.id, bob.id)
        .await
        .unwrap();
    assert!(result.following);
    assert!(ctx.state.relationships.is_following(alice.id, bob.id).await.unwrap());
    assert!(!ctx.state.relationships.is_following(bob.id, alice.id).await.unwrap());

    let views = ctx.invalidator.take();
    assert!(views.contains(&StaleView::Home));
    assert!(views.contains(&StaleView::Profile("bob".to_string())));
    assert!(views.contains(&StaleView::Notifications(bob.id)));

    let inbox = ctx
        .state
        .notifications
        .list_notifications(Some(bob.id))
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Follow);
    assert_eq!(inbox[0].actor.id, alice.id);
    assert!(inbox[0].post.is_none());

    let result = ctx
        .state
        .relationships
        .toggle_follow(alice.id, bob.id)
        .await
        .unwrap();
    assert!(!result.following);
    assert!(!ctx.state.relationships.is_following(alice.id, bob.id).await.unwrap());

    // unfollow leaves the earlier notification in place
    let inbox = ctx
        .state
        .notifications
        .list_notifications(Some(bob.id))
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
}

#[tokio::test]
async fn test_refollow_notifies_again() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;

    for _ in 0..3 {
        ctx.state
            .relationships
            .toggle_follow(alice.id, bob.id)
            .await
            .unwrap();
    }

    let inbox = ctx
        .state
        .notifications
        .list_notifications(Some(bob.id))
        .await
        .unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(ctx.state.relationships.is_following(alice.id, bob.id).await.unwrap());
}

#[tokio::test]
async fn test_cannot_follow_self() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;

    let err = ctx
        .state
        .relationships
        .toggle_follow(alice.id, alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_follow_unknown_user() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;

    let err = ctx
        .state
        .relationships
        .toggle_follow(alice.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_like_notifies_post_author() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;
    let post = ctx
        .state
        .content
        .create_post(alice.id, Some("hello".into()), None)
        .await
        .unwrap();

    let result = ctx
        .state
        .relationships
        .toggle_like(bob.id, post.id)
        .await
        .unwrap();
    assert!(result.liked);

    let inbox = ctx
        .state
        .notifications
        .list_notifications(Some(alice.id))
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Like);
    assert_eq!(inbox[0].actor.handle, "bob");
    assert_eq!(inbox[0].post.as_ref().map(|p| p.id), Some(post.id));

    let timeline = ctx.state.content.list_posts(Some(bob.id)).await.unwrap();
    assert_eq!(timeline[0].like_count, 1);
    assert!(timeline[0].has_liked);

    let timeline = ctx.state.content.list_posts(Some(alice.id)).await.unwrap();
    assert!(!timeline[0].has_liked);
}

#[tokio::test]
async fn test_self_like_has_no_notification() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let post = ctx
        .state
        .content
        .create_post(alice.id, Some("mine".into()), None)
        .await
        .unwrap();
    ctx.invalidator.take();

    let result = ctx
        .state
        .relationships
        .toggle_like(alice.id, post.id)
        .await
        .unwrap();
    assert!(result.liked);

    let inbox = ctx
        .state
        .notifications
        .list_notifications(Some(alice.id))
        .await
        .unwrap();
    assert!(inbox.is_empty());

    let views = ctx.invalidator.take();
    assert!(!views.contains(&StaleView::Notifications(alice.id)));
}

#[tokio::test]
async fn test_unlike_drops_like_count() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;
    let post = ctx
        .state
        .content
        .create_post(alice.id, Some("hello".into()), None)
        .await
        .unwrap();

    ctx.state.relationships.toggle_like(bob.id, post.id).await.unwrap();
    let result = ctx
        .state
        .relationships
        .toggle_like(bob.id, post.id)
        .await
        .unwrap();
    assert!(!result.liked);

    let timeline = ctx.state.content.list_posts(Some(bob.id)).await.unwrap();
    assert_eq!(timeline[0].like_count, 0);
    assert!(!timeline[0].has_liked);
}

#[tokio::test]
async fn test_like_missing_post() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;

    let err = ctx
        .state
        .relationships
        .toggle_like(alice.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_concurrent_follow_insert_conflicts() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;
    let repos = ctx.repos();

    let notification = NewNotification {
        recipient_id: bob.id,
        actor_id: alice.id,
        kind: NotificationKind::Follow,
        post_id: None,
        comment_id: None,
    };

    repos
        .follows
        .insert_with_notification(alice.id, bob.id, notification.clone())
        .await
        .unwrap();
    let err = repos
        .follows
        .insert_with_notification(alice.id, bob.id, notification)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    // the losing insert left no second notification behind
    let inbox = repos.notifications.list_for(bob.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
}

#[tokio::test]
async fn test_concurrent_like_insert_conflicts() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let post = ctx
        .state
        .content
        .create_post(alice.id, Some("x".into()), None)
        .await
        .unwrap();
    let repos = ctx.repos();

    repos
        .likes
        .insert_with_notification(alice.id, post.id, None)
        .await
        .unwrap();
    let err = repos
        .likes
        .insert_with_notification(alice.id, post.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

/// Existence check that always sees the edge, as when another request
/// removes it between the check and the delete.
struct StaleExists<R: ?Sized>(Arc<R>);

#[async_trait]
impl FollowRepository for StaleExists<dyn FollowRepository> {
    async fn exists(&self, _follower_id: Uuid, _followee_id: Uuid) -> ServiceResult<bool> {
        Ok(true)
    }

    async fn delete(&self, follower_id: Uuid, followee_id: Uuid) -> ServiceResult<bool> {
        self.0.delete(follower_id, followee_id).await
    }

    async fn insert_with_notification(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        notification: NewNotification,
    ) -> ServiceResult<Notification> {
        self.0
            .insert_with_notification(follower_id, followee_id, notification)
            .await
    }
}

#[async_trait]
impl LikeRepository for StaleExists<dyn LikeRepository> {
    async fn exists(&self, _user_id: Uuid, _post_id: Uuid) -> ServiceResult<bool> {
        Ok(true)
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        self.0.delete(user_id, post_id).await
    }

    async fn insert_with_notification(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        notification: Option<NewNotification>,
    ) -> ServiceResult<Option<Notification>> {
        self.0
            .insert_with_notification(user_id, post_id, notification)
            .await
    }
}

#[tokio::test]
async fn test_lost_unfollow_race_changes_nothing() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("alice").await;
    let bob = ctx.sign_up("bob").await;
    let post = ctx
        .state
        .content
        .create_post(bob.id, Some("hello".into()), None)
        .await
        .unwrap();
    let repos = ctx.repos();
    let service = RelationshipService::new(
        repos.users.clone(),
        Arc::new(StaleExists(repos.follows.clone())),
        Arc::new(StaleExists(repos.likes.clone())),
        repos.posts.clone(),
        ctx.invalidator.clone(),
    );
    ctx.invalidator.take();

    let toggle = service.toggle_follow(alice.id, bob.id).await.unwrap();
    assert!(!toggle.following);
    let toggle = service.toggle_like(alice.id, post.id).await.unwrap();
    assert!(!toggle.liked);

    // nothing was removed, so no view went stale
    assert!(ctx.invalidator.take().is_empty());
    assert!(!repos.follows.exists(alice.id, bob.id).await.unwrap());
    assert!(!repos.likes.exists(alice.id, post.id).await.unwrap());
}
