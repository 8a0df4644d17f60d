//! Follow and like toggles
//!
//! Each pair is either ABSENT or PRESENT. A toggle flips it; only
//! ABSENT -> PRESENT fans out a notification, and never to oneself.

use super::invalidation::ViewInvalidator;
use crate::domain::{FollowToggle, LikeToggle, NewNotification, NotificationKind};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{self, Relation};
use crate::repository::{FollowRepository, LikeRepository, PostRepository, UserRepository};
use cache_invalidation::StaleView;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct RelationshipService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
    likes: Arc<dyn LikeRepository>,
    posts: Arc<dyn PostRepository>,
    invalidator: Arc<dyn ViewInvalidator>,
}

impl RelationshipService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        follows: Arc<dyn FollowRepository>,
        likes: Arc<dyn LikeRepository>,
        posts: Arc<dyn PostRepository>,
        invalidator: Arc<dyn ViewInvalidator>,
    ) -> Self {
        Self {
            users,
            follows,
            likes,
            posts,
            invalidator,
        }
    }

    /// Follow `target_id`, or unfollow if already following
    pub async fn toggle_follow(&self, actor_id: Uuid, target_id: Uuid) -> ServiceResult<FollowToggle> {
        if actor_id == target_id {
            return Err(ServiceError::Validation("cannot follow yourself".to_string()));
        }

        let target = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", target_id)))?;

        if self.follows.exists(actor_id, target_id).await? {
            // a concurrent unfollow may have removed the edge already
            if self.follows.delete(actor_id, target_id).await? {
                metrics::record_toggle(Relation::Follow, false);
                tracing::debug!(actor_id = %actor_id, target_id = %target_id, "Unfollowed");

                self.invalidator
                    .invalidate(vec![StaleView::Home, StaleView::Profile(target.handle)])
                    .await;
            }
            return Ok(FollowToggle { following: false });
        }

        let notification = self
            .follows
            .insert_with_notification(
                actor_id,
                target_id,
                NewNotification {
                    recipient_id: target_id,
                    actor_id,
                    kind: NotificationKind::Follow,
                    post_id: None,
                    comment_id: None,
                },
            )
            .await?;

        metrics::record_toggle(Relation::Follow, true);
        metrics::record_notification(notification.kind);
        tracing::info!(actor_id = %actor_id, target_id = %target_id, "Followed");

        self.invalidator
            .invalidate(vec![
                StaleView::Home,
                StaleView::Profile(target.handle),
                StaleView::Notifications(target_id),
            ])
            .await;

        Ok(FollowToggle { following: true })
    }

    /// Like `post_id`, or unlike if already liked
    pub async fn toggle_like(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<LikeToggle> {
        let post = self
            .posts
            .find(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        if self.likes.exists(actor_id, post_id).await? {
            if self.likes.delete(actor_id, post_id).await? {
                metrics::record_toggle(Relation::Like, false);
                tracing::debug!(actor_id = %actor_id, post_id = %post_id, "Unliked");

                self.invalidator
                    .invalidate(vec![StaleView::Home, StaleView::Post(post_id)])
                    .await;
            }
            return Ok(LikeToggle { liked: false });
        }

        let notification = (post.author_id != actor_id).then(|| NewNotification {
            recipient_id: post.author_id,
            actor_id,
            kind: NotificationKind::Like,
            post_id: Some(post_id),
            comment_id: None,
        });

        let created = self
            .likes
            .insert_with_notification(actor_id, post_id, notification)
            .await?;

        metrics::record_toggle(Relation::Like, true);
        tracing::info!(actor_id = %actor_id, post_id = %post_id, "Liked");

        let mut views = vec![StaleView::Home, StaleView::Post(post_id)];
        if let Some(notification) = created {
            metrics::record_notification(notification.kind);
            views.push(StaleView::Notifications(notification.recipient_id));
        }
        self.invalidator.invalidate(views).await;

        Ok(LikeToggle { liked: true })
    }

    pub async fn is_following(&self, actor_id: Uuid, target_id: Uuid) -> ServiceResult<bool> {
        self.follows.exists(actor_id, target_id).await
    }
}
