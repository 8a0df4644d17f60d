//! Stale-view invalidation over Redis Pub/Sub
//!
//! After a write commits, the service tells the presentation layer which
//! rendered views no longer match the database.
//!
//! # Architecture
//!
//! ```text
//! social-service:
//!   1. Insert like + notification in one transaction, commit
//!   2. PUBLISH views:stale {"views": ["/", "/posts/<id>", "/notifications/<user>"], ...}
//!      ↓
//! Redis Pub/Sub (broadcast to all subscribers)
//!      ↓
//! Renderers / edge caches:
//!   3. Drop or re-render every listed path
//! ```
//!
//! # Example
//!
//! ```no_run
//! use cache_invalidation::{InvalidationPublisher, StaleView};
//!
//! # async fn run() -> Result<(), cache_invalidation::InvalidationError> {
//! let publisher = InvalidationPublisher::new(
//!     "redis://localhost:6379",
//!     "social-service".to_string(),
//! )
//! .await?;
//!
//! publisher
//!     .invalidate(vec![StaleView::Home, StaleView::Profile("ada".into())])
//!     .await?;
//! # Ok(())
//! # }
//! ```

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

mod error;
pub mod helpers;

pub use error::InvalidationError;
pub use helpers::{parse_view_path, view_path};

type Result<T> = std::result::Result<T, InvalidationError>;

/// A rendered view that must be refreshed after a write.
///
/// Serialized as its path, e.g. `"/profile/ada"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum StaleView {
    /// Global timeline
    Home,
    /// Profile page of a handle
    Profile(String),
    /// Posts tab of an author
    UserPosts(Uuid),
    /// A single post with its likes and comments
    Post(Uuid),
    /// Notification inbox of a user
    Notifications(Uuid),
}

impl fmt::Display for StaleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&view_path(self))
    }
}

impl FromStr for StaleView {
    type Err = InvalidationError;

    fn from_str(s: &str) -> Result<Self> {
        parse_view_path(s)
    }
}

impl From<StaleView> for String {
    fn from(view: StaleView) -> Self {
        view_path(&view)
    }
}

impl TryFrom<String> for StaleView {
    type Error = InvalidationError;

    fn try_from(value: String) -> Result<Self> {
        parse_view_path(&value)
    }
}

/// Message broadcast on the invalidation channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationMessage {
    pub message_id: String,
    pub views: Vec<StaleView>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub source_service: String,
}

impl InvalidationMessage {
    pub fn new(views: Vec<StaleView>, source_service: String) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            views,
            timestamp: chrono::Utc::now(),
            source_service,
        }
    }
}

/// Publisher for stale-view messages
#[derive(Clone)]
pub struct InvalidationPublisher {
    client: ConnectionManager,
    channel: String,
    service_name: String,
}

impl InvalidationPublisher {
    /// Default Redis channel for stale-view messages
    pub const DEFAULT_CHANNEL: &'static str = "views:stale";

    /// Connect to Redis and publish on [`Self::DEFAULT_CHANNEL`]
    pub async fn new(redis_url: &str, service_name: String) -> Result<Self> {
        Self::with_channel(redis_url, service_name, Self::DEFAULT_CHANNEL.to_string()).await
    }

    /// Connect to Redis and publish on a custom channel
    pub async fn with_channel(
        redis_url: &str,
        service_name: String,
        channel: String,
    ) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            client: connection,
            channel,
            service_name,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Publish a message.
    ///
    /// Returns number of subscribers that received it.
    pub async fn publish(&self, msg: InvalidationMessage) -> Result<usize> {
        let payload = serde_json::to_string(&msg)?;

        debug!(
            message_id = %msg.message_id,
            views = msg.views.len(),
            channel = %self.channel,
            "Publishing stale views"
        );

        let mut conn = self.client.clone();
        let subscriber_count: usize = conn.publish(&self.channel, payload).await?;

        info!(
            message_id = %msg.message_id,
            subscribers = subscriber_count,
            "Stale views published"
        );

        Ok(subscriber_count)
    }

    /// Publish the given views as one message. Empty input publishes nothing.
    pub async fn invalidate(&self, views: Vec<StaleView>) -> Result<usize> {
        if views.is_empty() {
            return Ok(0);
        }
        let msg = InvalidationMessage::new(views, self.service_name.clone());
        self.publish(msg).await
    }
}
