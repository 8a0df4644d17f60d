use super::notifications::insert_notification;
use super::CommentRepository;
use crate::domain::{Comment, NewNotification, Notification};
use crate::error::{is_foreign_key_violation, ServiceError, ServiceResult};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Comment operations
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn insert_with_notification(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        content: String,
        notification: Option<NewNotification>,
    ) -> ServiceResult<(Comment, Option<Notification>)> {
        let mut tx = self.pool.begin().await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, author_id, post_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, post_id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(post_id)
        .bind(&content)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ServiceError::NotFound(format!("post {}", post_id))
            } else {
                ServiceError::Database(e)
            }
        })?;

        let created = match notification {
            Some(mut notification) => {
                notification.comment_id = Some(comment.id);
                Some(insert_notification(&mut *tx, &notification).await?)
            }
            None => None,
        };

        tx.commit().await?;

        Ok((comment, created))
    }
}
