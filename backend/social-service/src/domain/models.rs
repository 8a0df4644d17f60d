use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Entities
// ============================================================================

/// User entity, created on first identity sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    /// Identity-provider subject
    pub external_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub handle: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub websites: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: Option<String>,
    /// Opaque image URL returned by the object store
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Like entity - a user liking a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Follow entity - directed edge follower -> followee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "notification_kind", rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Follow => "FOLLOW",
            NotificationKind::Like => "LIKE",
            NotificationKind::Comment => "COMMENT",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FOLLOW" => Ok(NotificationKind::Follow),
            "LIKE" => Ok(NotificationKind::Like),
            "COMMENT" => Ok(NotificationKind::Comment),
            other => Err(format!("unknown notification kind: {}", other)),
        }
    }
}

/// Notification entity - derived from a follow, like or comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Write inputs
// ============================================================================

/// Fields of a user created on first sync
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub external_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub handle: String,
    pub image: Option<String>,
}

/// Normalized post content; at least one of the two is present
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub author_id: Uuid,
    pub content: Option<String>,
    pub image: Option<String>,
}

/// Derived notification written alongside a follow, like or comment
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub kind: NotificationKind,
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
}

/// Profile edit request
///
/// Absent fields are left untouched; blank strings clear the field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(max = 100, message = "name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 100, message = "location must be at most 100 characters"))]
    pub location: Option<String>,
    #[validate(length(max = 10, message = "at most 10 websites"))]
    pub websites: Option<Vec<String>>,
}

/// Normalized profile changes applied by the repository.
/// Outer `None` leaves a field untouched, inner `None` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub websites: Option<Vec<String>>,
}

// ============================================================================
// Read models
// ============================================================================

/// Which posts a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    ByAuthor(Uuid),
    LikedBy(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub handle: String,
    pub image: Option<String>,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            handle: user.handle.clone(),
            image: user.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
}

/// A post as rendered in timelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub content: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    /// Newest first unless the listing says otherwise
    pub comments: Vec<CommentView>,
    pub liker_ids: Vec<Uuid>,
    pub like_count: i64,
    pub comment_count: i64,
    /// Whether the viewing user liked the post
    pub has_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub name: Option<String>,
    pub handle: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub websites: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
}

/// Follow/following/post totals of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct ProfileCounts {
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
}

impl ProfileView {
    pub fn new(user: User, counts: ProfileCounts) -> Self {
        Self {
            id: user.id,
            name: user.name,
            handle: user.handle,
            bio: user.bio,
            image: user.image,
            location: user.location,
            websites: user.websites,
            created_at: user.created_at,
            follower_count: counts.follower_count,
            following_count: counts.following_count,
            post_count: counts.post_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SuggestedUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub handle: String,
    pub image: Option<String>,
    pub follower_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub content: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A notification with the summaries the inbox renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub actor: AuthorSummary,
    pub post: Option<PostSummary>,
    pub comment: Option<CommentSummary>,
}

// ============================================================================
// Operation results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowToggle {
    pub following: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUpload {
    pub file_url: String,
}
