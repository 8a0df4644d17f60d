use super::notifications::insert_notification;
use super::LikeRepository;
use crate::domain::{NewNotification, Notification};
use crate::error::{is_foreign_key_violation, ServiceError, ServiceResult};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Like operations
#[derive(Clone)]
pub struct PgLikeRepository {
    pool: PgPool,
}

impl PgLikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    /// Check if user has liked a post
    async fn exists(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE user_id = $1 AND post_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM likes
            WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_with_notification(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        notification: Option<NewNotification>,
    ) -> ServiceResult<Option<Notification>> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO likes (user_id, post_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, post_id) DO NOTHING
            RETURNING post_id
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(inserted) => inserted,
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(ServiceError::NotFound(format!("post {}", post_id)));
            }
            Err(e) => return Err(e.into()),
        };

        if inserted.is_none() {
            tx.rollback().await?;
            return Err(ServiceError::Conflict(
                "like was created concurrently".to_string(),
            ));
        }

        let created = match notification {
            Some(notification) => Some(insert_notification(&mut *tx, &notification).await?),
            None => None,
        };
        tx.commit().await?;

        Ok(created)
    }
}
