pub mod content;
pub mod directory;
pub mod identity;
pub mod invalidation;
pub mod media;
pub mod notifications;
pub mod profiles;
pub mod relationships;

pub use content::{CommentOrder, ContentService};
pub use directory::{DirectoryProfile, HttpIdentityDirectory, IdentityDirectory, UnconfiguredDirectory};
pub use identity::IdentityResolver;
pub use invalidation::{NoopViewInvalidator, RedisViewInvalidator, ViewInvalidator};
pub use media::{ImageStore, MediaService, S3ImageStore, MAX_IMAGE_BYTES};
pub use notifications::NotificationFeed;
pub use profiles::ProfileService;
pub use relationships::RelationshipService;
