//! Persistence seams
//!
//! Each trait covers one table family. Writes that fan out a notification
//! take the notification as an argument so the implementation can commit
//! both rows atomically. `Pg*Repository` types run against PostgreSQL;
//! [`MemoryStore`] implements every trait for tests and local demos.

pub mod comments;
pub mod follows;
pub mod likes;
pub mod memory;
pub mod notifications;
pub mod posts;
pub mod users;

use crate::domain::{
    Comment, NewNotification, NewPost, NewUser, Notification, NotificationView, Post,
    PostFilter, PostView, ProfileChanges, ProfileCounts, SuggestedUser, User,
};
use crate::error::ServiceResult;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub use comments::PgCommentRepository;
pub use follows::PgFollowRepository;
pub use likes::PgLikeRepository;
pub use memory::MemoryStore;
pub use notifications::PgNotificationRepository;
pub use posts::PgPostRepository;
pub use users::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>>;

    async fn find_by_external_id(&self, external_id: &str) -> ServiceResult<Option<User>>;

    async fn find_by_handle(&self, handle: &str) -> ServiceResult<Option<User>>;

    /// Insert a new user. A duplicate external id or handle is `Conflict`.
    async fn insert(&self, user: NewUser) -> ServiceResult<User>;

    /// Apply profile changes; `NotFound` for an unknown id
    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> ServiceResult<User>;

    async fn profile_counts(&self, id: Uuid) -> ServiceResult<ProfileCounts>;

    /// Random users other than `viewer` that `viewer` does not follow
    async fn suggested(&self, viewer: Uuid, limit: i64) -> ServiceResult<Vec<SuggestedUser>>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn exists(&self, follower_id: Uuid, followee_id: Uuid) -> ServiceResult<bool>;

    /// Returns true if a row was removed
    async fn delete(&self, follower_id: Uuid, followee_id: Uuid) -> ServiceResult<bool>;

    /// Insert the edge and its notification atomically.
    /// `Conflict` when the edge already exists; nothing is written then.
    async fn insert_with_notification(
        &self,
        follower_id: Uuid,
        followee_id: Uuid,
        notification: NewNotification,
    ) -> ServiceResult<Notification>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn exists(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool>;

    /// Returns true if a row was removed
    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool>;

    /// Insert the like and, if given, its notification atomically.
    /// `Conflict` when the like already exists, `NotFound` when the post is gone.
    async fn insert_with_notification(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        notification: Option<NewNotification>,
    ) -> ServiceResult<Option<Notification>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> ServiceResult<Option<Post>>;

    async fn insert(&self, post: NewPost) -> ServiceResult<Post>;

    /// Delete a post with its comments, likes and notifications.
    /// Returns true if the post existed.
    async fn delete(&self, id: Uuid) -> ServiceResult<bool>;

    /// Posts newest first, comments newest first, `has_liked` unset
    async fn list(&self, filter: PostFilter) -> ServiceResult<Vec<PostView>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert the comment and, if given, its notification atomically.
    /// The notification's `comment_id` is filled with the new comment id.
    async fn insert_with_notification(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: String,
        notification: Option<NewNotification>,
    ) -> ServiceResult<(Comment, Option<Notification>)>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Inbox of `recipient_id`, newest first
    async fn list_for(&self, recipient_id: Uuid) -> ServiceResult<Vec<NotificationView>>;

    /// Mark the recipient's unread notifications among `ids` as read.
    /// Returns the number of notifications changed.
    async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> ServiceResult<u64>;
}

/// All repositories the services need
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            follows: Arc::new(PgFollowRepository::new(pool.clone())),
            likes: Arc::new(PgLikeRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool)),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            follows: store.clone(),
            likes: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            notifications: store,
        }
    }
}
