//! Stale-view signalling after committed writes

use async_trait::async_trait;
use cache_invalidation::{InvalidationPublisher, StaleView};

/// Receives the views a committed write made stale.
///
/// Failures never propagate to the caller; the write already happened.
#[async_trait]
pub trait ViewInvalidator: Send + Sync {
    async fn invalidate(&self, views: Vec<StaleView>);
}

/// Publishes stale views on Redis Pub/Sub
pub struct RedisViewInvalidator {
    publisher: InvalidationPublisher,
}

impl RedisViewInvalidator {
    pub fn new(publisher: InvalidationPublisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl ViewInvalidator for RedisViewInvalidator {
    async fn invalidate(&self, views: Vec<StaleView>) {
        let count = views.len();
        if let Err(err) = self.publisher.invalidate(views).await {
            tracing::warn!(
                views = count,
                channel = %self.publisher.channel(),
                "view invalidation failed: {}",
                err
            );
        }
    }
}

/// Used when Redis is not configured
pub struct NoopViewInvalidator;

#[async_trait]
impl ViewInvalidator for NoopViewInvalidator {
    async fn invalidate(&self, views: Vec<StaleView>) {
        tracing::trace!(views = views.len(), "view invalidation disabled");
    }
}
