//! Profile pages, profile editing and follow suggestions

use super::content::{present_posts, CommentOrder};
use super::invalidation::ViewInvalidator;
use crate::domain::{
    normalize_websites, PostFilter, PostView, ProfileChanges, ProfileView, SuggestedUser,
    UpdateProfile, User,
};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{PostRepository, UserRepository};
use cache_invalidation::StaleView;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const SUGGESTION_LIMIT: i64 = 3;

#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    invalidator: Arc<dyn ViewInvalidator>,
}

/// Limits apply to what gets stored, so trim and dedupe first.
fn normalized(update: UpdateProfile) -> UpdateProfile {
    let trim = |v: Option<String>| v.map(|v| v.trim().to_string());
    UpdateProfile {
        name: trim(update.name),
        bio: trim(update.bio),
        location: trim(update.location),
        websites: update.websites.map(normalize_websites),
    }
}

/// Trimmed value, blank clears
fn field_change(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        invalidator: Arc<dyn ViewInvalidator>,
    ) -> Self {
        Self {
            users,
            posts,
            invalidator,
        }
    }

    async fn user_by_handle(&self, handle: &str) -> ServiceResult<User> {
        self.users
            .find_by_handle(handle)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile @{}", handle)))
    }

    pub async fn get_profile(&self, handle: &str) -> ServiceResult<ProfileView> {
        let user = self.user_by_handle(handle).await?;
        let counts = self.users.profile_counts(user.id).await?;
        Ok(ProfileView::new(user, counts))
    }

    /// Posts written by `handle`, newest first
    pub async fn list_author_posts(
        &self,
        handle: &str,
        viewer: Option<Uuid>,
    ) -> ServiceResult<Vec<PostView>> {
        let user = self.user_by_handle(handle).await?;
        let views = self.posts.list(PostFilter::ByAuthor(user.id)).await?;
        Ok(present_posts(views, viewer, CommentOrder::NewestFirst))
    }

    /// Posts liked by `handle`, newest first, comments oldest first
    pub async fn list_liked_posts(
        &self,
        handle: &str,
        viewer: Option<Uuid>,
    ) -> ServiceResult<Vec<PostView>> {
        let user = self.user_by_handle(handle).await?;
        let views = self.posts.list(PostFilter::LikedBy(user.id)).await?;
        Ok(present_posts(views, viewer, CommentOrder::OldestFirst))
    }

    pub async fn update_profile(&self, actor_id: Uuid, update: UpdateProfile) -> ServiceResult<User> {
        let update = normalized(update);
        update.validate()?;

        let changes = ProfileChanges {
            name: field_change(update.name),
            bio: field_change(update.bio),
            location: field_change(update.location),
            websites: update.websites,
        };

        let user = self.users.update_profile(actor_id, changes).await?;
        tracing::info!(user_id = %user.id, "Profile updated");

        self.invalidator
            .invalidate(vec![StaleView::Profile(user.handle.clone())])
            .await;

        Ok(user)
    }

    /// Up to three users the viewer does not follow yet
    pub async fn suggested_users(&self, viewer: Option<Uuid>) -> ServiceResult<Vec<SuggestedUser>> {
        match viewer {
            Some(viewer) => self.users.suggested(viewer, SUGGESTION_LIMIT).await,
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_change() {
        assert_eq!(field_change(None), None);
        assert_eq!(field_change(Some("  ".into())), Some(None));
        assert_eq!(field_change(Some(" Paris ".into())), Some(Some("Paris".into())));
    }

    #[test]
    fn test_normalized_before_limits() {
        let update = normalized(UpdateProfile {
            name: Some(" ".repeat(101)),
            websites: Some(vec!["a.com".to_string(); 11]),
            ..Default::default()
        });
        assert!(update.validate().is_ok());
        assert_eq!(update.name.as_deref(), Some(""));
        assert_eq!(update.websites.map(|w| w.len()), Some(1));
    }
}
