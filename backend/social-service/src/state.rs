use crate::repository::Repositories;
use crate::services::{
    ContentService, IdentityDirectory, IdentityResolver, ImageStore, MediaService,
    NotificationFeed, ProfileService, RelationshipService, ViewInvalidator,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityResolver,
    pub relationships: RelationshipService,
    pub content: ContentService,
    pub notifications: NotificationFeed,
    pub profiles: ProfileService,
    pub media: MediaService,
    /// Checked by `/ready` when running on PostgreSQL
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        directory: Arc<dyn IdentityDirectory>,
        invalidator: Arc<dyn ViewInvalidator>,
        images: Option<Arc<dyn ImageStore>>,
    ) -> Self {
        Self {
            identity: IdentityResolver::new(repos.users.clone(), directory),
            relationships: RelationshipService::new(
                repos.users.clone(),
                repos.follows.clone(),
                repos.likes.clone(),
                repos.posts.clone(),
                invalidator.clone(),
            ),
            content: ContentService::new(
                repos.users.clone(),
                repos.posts.clone(),
                repos.comments.clone(),
                invalidator.clone(),
            ),
            notifications: NotificationFeed::new(repos.notifications.clone(), invalidator.clone()),
            profiles: ProfileService::new(repos.users, repos.posts, invalidator),
            media: MediaService::new(images),
            pool: None,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}
