use super::invalidation::ViewInvalidator;
use crate::domain::NotificationView;
use crate::error::ServiceResult;
use crate::repository::NotificationRepository;
use cache_invalidation::StaleView;
use std::sync::Arc;
use uuid::Uuid;

/// Per-user notification inbox
#[derive(Clone)]
pub struct NotificationFeed {
    notifications: Arc<dyn NotificationRepository>,
    invalidator: Arc<dyn ViewInvalidator>,
}

impl NotificationFeed {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        invalidator: Arc<dyn ViewInvalidator>,
    ) -> Self {
        Self {
            notifications,
            invalidator,
        }
    }

    /// Inbox newest first; anonymous callers get an empty list
    pub async fn list_notifications(
        &self,
        recipient_id: Option<Uuid>,
    ) -> ServiceResult<Vec<NotificationView>> {
        match recipient_id {
            Some(recipient_id) => self.notifications.list_for(recipient_id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Mark the caller's notifications read. Ids owned by other users are ignored.
    pub async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> ServiceResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let updated = self.notifications.mark_read(recipient_id, ids).await?;
        tracing::debug!(
            recipient_id = %recipient_id,
            requested = ids.len(),
            updated,
            "Notifications marked read"
        );

        if updated > 0 {
            self.invalidator
                .invalidate(vec![StaleView::Notifications(recipient_id)])
                .await;
        }

        Ok(updated)
    }
}
