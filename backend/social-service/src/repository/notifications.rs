use super::NotificationRepository;
use crate::domain::{
    AuthorSummary, CommentSummary, NewNotification, Notification, NotificationKind,
    NotificationView, PostSummary,
};
use crate::error::ServiceResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Insert a derived notification on an open connection or transaction
pub(crate) async fn insert_notification(
    conn: &mut PgConnection,
    notification: &NewNotification,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (id, recipient_id, actor_id, kind, post_id, comment_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, recipient_id, actor_id, kind, post_id, comment_id, read, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(notification.recipient_id)
    .bind(notification.actor_id)
    .bind(notification.kind)
    .bind(notification.post_id)
    .bind(notification.comment_id)
    .fetch_one(conn)
    .await
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    kind: NotificationKind,
    read: bool,
    created_at: DateTime<Utc>,
    actor_id: Uuid,
    actor_name: Option<String>,
    actor_handle: String,
    actor_image: Option<String>,
    post_id: Option<Uuid>,
    post_content: Option<String>,
    post_image: Option<String>,
    comment_id: Option<Uuid>,
    comment_content: Option<String>,
    comment_created_at: Option<DateTime<Utc>>,
}

impl From<NotificationRow> for NotificationView {
    fn from(row: NotificationRow) -> Self {
        let comment = match (row.comment_id, row.comment_content, row.comment_created_at) {
            (Some(id), Some(content), Some(created_at)) => Some(CommentSummary {
                id,
                content,
                created_at,
            }),
            _ => None,
        };

        NotificationView {
            id: row.id,
            kind: row.kind,
            read: row.read,
            created_at: row.created_at,
            actor: AuthorSummary {
                id: row.actor_id,
                name: row.actor_name,
                handle: row.actor_handle,
                image: row.actor_image,
            },
            post: row.post_id.map(|id| PostSummary {
                id,
                content: row.post_content,
                image: row.post_image,
            }),
            comment,
        }
    }
}

/// Repository for Notification operations
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn list_for(&self, recipient_id: Uuid) -> ServiceResult<Vec<NotificationView>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT n.id, n.kind, n.read, n.created_at,
                   a.id AS actor_id, a.name AS actor_name,
                   a.handle AS actor_handle, a.image AS actor_image,
                   p.id AS post_id, p.content AS post_content, p.image AS post_image,
                   c.id AS comment_id, c.content AS comment_content,
                   c.created_at AS comment_created_at
            FROM notifications n
            JOIN users a ON a.id = n.actor_id
            LEFT JOIN posts p ON p.id = n.post_id
            LEFT JOIN comments c ON c.id = n.comment_id
            WHERE n.recipient_id = $1
            ORDER BY n.created_at DESC, n.id DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(NotificationView::from).collect())
    }

    async fn mark_read(&self, recipient_id: Uuid, ids: &[Uuid]) -> ServiceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE recipient_id = $1 AND id = ANY($2) AND read = FALSE
            "#,
        )
        .bind(recipient_id)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
