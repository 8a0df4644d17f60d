//! Posts and comments
use super::invalidation::ViewInvalidator;
use crate::domain::{
    Comment, NewNotification, NewPost, NotificationKind, Post, PostFilter, PostView,
};
use crate::error::{ServiceError, ServiceResult};
use crate::metrics;
use crate::repository::{CommentRepository, PostRepository, UserRepository};
use cache_invalidation::StaleView;
use std::sync::Arc;
use uuid::Uuid;

/// Order of the comments embedded in a post listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOrder {
    NewestFirst,
    OldestFirst,
}

/// Fill `has_liked` for the viewer and put comments in the requested order
pub(crate) fn present_posts(
    mut views: Vec<PostView>,
    viewer: Option<Uuid>,
    order: CommentOrder,
) -> Vec<PostView> {
    for view in &mut views {
        view.has_liked = viewer.is_some_and(|v| view.liker_ids.contains(&v));
        if order == CommentOrder::OldestFirst {
            view.comments.reverse();
        }
    }
    views
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct ContentService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    invalidator: Arc<dyn ViewInvalidator>,
}

impl ContentService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        invalidator: Arc<dyn ViewInvalidator>,
    ) -> Self {
        Self {
            users,
            posts,
            comments,
            invalidator,
        }
    }

    /// Author pages whose post list or post count changed.
    /// A failed handle lookup only drops the profile view.
    async fn author_views(&self, author_id: Uuid) -> Vec<StaleView> {
        let mut views = vec![StaleView::UserPosts(author_id)];
        match self.users.find_by_id(author_id).await {
            Ok(Some(author)) => views.push(StaleView::Profile(author.handle)),
            Ok(None) => {}
            Err(e) => tracing::warn!(author_id = %author_id, error = %e, "Author lookup failed"),
        }
        views
    }

    /// Create a post. Content is trimmed; a post needs content or an image.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        content: Option<String>,
        image: Option<String>,
    ) -> ServiceResult<Post> {
        let content = trimmed(content);
        let image = trimmed(image);

        if content.is_none() && image.is_none() {
            return Err(ServiceError::Validation(
                "post needs content or an image".to_string(),
            ));
        }

        let post = self
            .posts
            .insert(NewPost {
                author_id,
                content,
                image,
            })
            .await?;

        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");

        let mut views = vec![StaleView::Home];
        views.extend(self.author_views(author_id).await);
        self.invalidator.invalidate(views).await;

        Ok(post)
    }

    /// Comment on a post, notifying its author unless they wrote the comment
    pub async fn create_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: &str,
    ) -> ServiceResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation(
                "comment content is required".to_string(),
            ));
        }

        let post = self
            .posts
            .find(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        let notification = (post.author_id != author_id).then(|| NewNotification {
            recipient_id: post.author_id,
            actor_id: author_id,
            kind: NotificationKind::Comment,
            post_id: Some(post_id),
            comment_id: None,
        });

        let (comment, created) = self
            .comments
            .insert_with_notification(author_id, post_id, content.to_string(), notification)
            .await?;

        tracing::info!(comment_id = %comment.id, post_id = %post_id, "Comment created");

        let mut views = vec![StaleView::Home, StaleView::Post(post_id)];
        if let Some(notification) = created {
            metrics::record_notification(notification.kind);
            views.push(StaleView::Notifications(notification.recipient_id));
        }
        self.invalidator.invalidate(views).await;

        Ok(comment)
    }

    /// Delete a post; only its author may
    pub async fn delete_post(&self, requester_id: Uuid, post_id: Uuid) -> ServiceResult<()> {
        let post = self
            .posts
            .find(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("post {}", post_id)))?;

        if post.author_id != requester_id {
            return Err(ServiceError::Forbidden(
                "only the author can delete this post".to_string(),
            ));
        }

        if !self.posts.delete(post_id).await? {
            // deleted concurrently by the same author
            return Err(ServiceError::NotFound(format!("post {}", post_id)));
        }

        tracing::info!(post_id = %post_id, "Post deleted");

        let mut views = vec![StaleView::Home, StaleView::Post(post_id)];
        views.extend(self.author_views(post.author_id).await);
        self.invalidator.invalidate(views).await;

        Ok(())
    }

    /// All posts newest first, as seen by `viewer`
    pub async fn list_posts(&self, viewer: Option<Uuid>) -> ServiceResult<Vec<PostView>> {
        let views = self.posts.list(PostFilter::All).await?;
        Ok(present_posts(views, viewer, CommentOrder::NewestFirst))
    }
}
