//! Process-local implementation of every repository trait
//!
//! All tables live behind one mutex, so each write (including the
//! follow/like/comment + notification pairs) is atomic. Foreign-key cascades
//! and uniqueness constraints mirror the PostgreSQL schema.

use super::{
    CommentRepository, FollowRepository, LikeRepository, NotificationRepository,
    PostRepository, UserRepository,
};
use crate::domain::{
    AuthorSummary, Comment, CommentSummary, CommentView, Follow, Like, NewNotification, NewPost,
    NewUser, Notification, NotificationView, Post, PostFilter, PostSummary, PostView,
    ProfileChanges, ProfileCounts, SuggestedUser, User,
};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: Vec<Like>,
    follows: Vec<Follow>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn author(&self, id: Uuid) -> ServiceResult<AuthorSummary> {
        self.user(id)
            .map(AuthorSummary::from)
            .ok_or_else(|| ServiceError::Internal(format!("dangling user reference {}", id)))
    }

    fn post_exists(&self, id: Uuid) -> bool {
        self.posts.iter().any(|p| p.id == id)
    }

    fn push_notification(&mut self, notification: NewNotification) -> Notification {
        let created = Notification {
            id: Uuid::new_v4(),
            recipient_id: notification.recipient_id,
            actor_id: notification.actor_id,
            kind: notification.kind,
            post_id: notification.post_id,
            comment_id: notification.comment_id,
            read: false,
            created_at: Utc::now(),
        };
        self.notifications.push(created.clone());
        created
    }

    fn post_view(&self, post: &Post) -> ServiceResult<PostView> {
        let comments = self
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post.id)
            .map(|c| {
                Ok(CommentView {
                    id: c.id,
                    content: c.content.clone(),
                    created_at: c.created_at,
                    author: self.author(c.author_id)?,
                })
            })
            .collect::<ServiceResult<Vec<_>>>()?;

        let liker_ids: Vec<Uuid> = self
            .likes
            .iter()
            .filter(|l| l.post_id == post.id)
            .map(|l| l.user_id)
            .collect();

        Ok(PostView {
            id: post.id,
            content: post.content.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author: self.author(post.author_id)?,
            comment_count: comments.len() as i64,
            like_count: liker_ids.len() as i64,
            comments,
            liker_ids,
            has_liked: false,
        })
    }
}

/// In-memory store for tests and `STORAGE_BACKEND=memory`
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.user(id).cloned())
    }

    async fn find_by_external_id(&self, external_id: &str) -> ServiceResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> ServiceResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.handle == handle).cloned())
    }

    async fn insert(&self, user: NewUser) -> ServiceResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.external_id == user.external_id || u.handle == user.handle)
        {
            return Err(ServiceError::Conflict(format!(
                "user with handle '{}' or this identity already exists",
                user.handle
            )));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            external_id: user.external_id,
            email: user.email,
            name: user.name,
            handle: user.handle,
            bio: None,
            image: user.image,
            location: None,
            websites: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> ServiceResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("user {}", id)))?;

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(bio) = changes.bio {
            user.bio = bio;
        }
        if let Some(location) = changes.location {
            user.location = location;
        }
        if let Some(websites) = changes.websites {
            user.websites = websites;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn profile_counts(&self, id: Uuid) -> ServiceResult<ProfileCounts> {
        let state = self.state.lock().await;
        Ok(ProfileCounts {
            follower_count: state.follows.iter().filter(|f| f.followee_id == id).count() as i64,
            following_count: state.follows.iter().filter(|f| f.follower_id == id).count() as i64,
            post_count: state.posts.iter().filter(|p| p.author_id == id).count() as i64,
        })
    }

    async fn suggested(&self, viewer: Uuid, limit: i64) -> ServiceResult<Vec<SuggestedUser>> {
        let state = self.state.lock().await;
        let mut candidates: Vec<SuggestedUser> = state
            .users
            .iter()
            .filter(|u| u.id != viewer)
            .filter(|u| {
                !state
                    .follows
                    .iter()
                    .any(|f| f.follower_id == viewer && f.followee_id == u.id)
            })
            .map(|u| SuggestedUser {
                id: u.id,
                name: u.name.clone(),
                handle: u.handle.clone(),
                image: u.image.clone(),
                follower_count: state.follows.iter().filter(|f| f.followee_id == u.id).count()
                    as i64,
            })
            .collect();

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(limit.max(0) as usize);
        Ok(candidates)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn exists(&self, follower_id: Uuid, followee_id: Uuid) -> ServiceResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followee_id == followee_id))
    }

    async fn delete(&self, follower_id: Uuid, followee_id: Uuid) -> ServiceResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.follower_id == follower_id && f.followee_id == followee_id));
        Ok(state.follows.len() < before)
    }

    async fn insert_with_notification(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        notification: NewNotification,
    ) -> ServiceResult<Notification> {
        let mut state = self.state.lock().await;
        if follower_id == followee_id {
            return Err(ServiceError::Validation("cannot follow yourself".to_string()));
        }
        if state.user(followee_id).is_none() || state.user(follower_id).is_none() {
            return Err(ServiceError::NotFound(format!("user {}", followee_id)));
        }
        if state
            .follows
            .iter()
            .any(|f| f.follower_id == follower_id && f.followee_id == followee_id)
        {
            return Err(ServiceError::Conflict(
                "follow was created concurrently".to_string(),
            ));
        }

        state.follows.push(Follow {
            follower_id,
            followee_id,
            created_at: Utc::now(),
        });
        Ok(state.push_notification(notification))
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn exists(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id))
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.likes.len();
        state
            .likes
            .retain(|l| !(l.user_id == user_id && l.post_id == post_id));
        Ok(state.likes.len() < before)
    }

    async fn insert_with_notification(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        notification: Option<NewNotification>,
    ) -> ServiceResult<Option<Notification>> {
        let mut state = self.state.lock().await;
        if !state.post_exists(post_id) {
            return Err(ServiceError::NotFound(format!("post {}", post_id)));
        }
        if state
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Err(ServiceError::Conflict(
                "like was created concurrently".to_string(),
            ));
        }

        state.likes.push(Like {
            user_id,
            post_id,
            created_at: Utc::now(),
        });
        Ok(notification.map(|n| state.push_notification(n)))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn find(&self, id: Uuid) -> ServiceResult<Option<Post>> {
        let state = self.state.lock().await;
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: NewPost) -> ServiceResult<Post> {
        let mut state = self.state.lock().await;
        if state.user(post.author_id).is_none() {
            return Err(ServiceError::NotFound(format!("user {}", post.author_id)));
        }

        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            content: post.content,
            image: post.image,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.posts.len();
        state.posts.retain(|p| p.id != id);
        if state.posts.len() == before {
            return Ok(false);
        }

        state.comments.retain(|c| c.post_id != id);
        state.likes.retain(|l| l.post_id != id);
        state.notifications.retain(|n| n.post_id != Some(id));
        Ok(true)
    }

    async fn list(&self, filter: PostFilter) -> ServiceResult<Vec<PostView>> {
        let state = self.state.lock().await;
        state
            .posts
            .iter()
            .rev()
            .filter(|p| match filter {
                PostFilter::All => true,
                PostFilter::ByAuthor(author) => p.author_id == author,
                PostFilter::LikedBy(user) => state
                    .likes
                    .iter()
                    .any(|l| l.post_id == p.id && l.user_id == user),
            })
            .map(|p| state.post_view(p))
            .collect()
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert_with_notification(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: String,
        notification: Option<NewNotification>,
    ) -> ServiceResult<(Comment, Option<Notification>)> {
        let mut state = self.state.lock().await;
        if !state.post_exists(post_id) {
            return Err(ServiceError::NotFound(format!("post {}", post_id)));
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            author_id,
            post_id,
            content,
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());

        let created = notification.map(|mut n| {
            n.comment_id = Some(comment.id);
            state.push_notification(n)
        });

        Ok((comment, created))
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_for(&self, recipient_id: Uuid) -> ServiceResult<Vec<NotificationView>> {
        let state = self.state.lock().await;
        state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| {
                let post = n
                    .post_id
                    .and_then(|id| state.posts.iter().find(|p| p.id == id))
                    .map(|p| PostSummary {
                        id: p.id,
                        content: p.content.clone(),
                        image: p.image.clone(),
                    });
                let comment = n
                    .comment_id
                    .and_then(|id| state.comments.iter().find(|c| c.id == id))
                    .map(|c| CommentSummary {
                        id: c.id,
                        content: c.content.clone(),
                        created_at: c.created_at,
                    });

                Ok(NotificationView {
                    id: n.id,
                    kind: n.kind,
                    read: n.read,
                    created_at: n.created_at,
                    actor: state.author(n.actor_id)?,
                    post,
                    comment,
                })
            })
            .collect()
    }

    async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> ServiceResult<u64> {
        let mut state = self.state.lock().await;
        let mut updated = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.read && ids.contains(&n.id))
        {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }
}
