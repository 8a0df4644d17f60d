use super::UserRepository;
use crate::domain::{NewUser, ProfileChanges, ProfileCounts, SuggestedUser, User};
use crate::error::{is_unique_violation, ServiceError, ServiceResult};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, external_id, email, name, handle, bio, image, location, websites, created_at, updated_at";

/// Repository for User operations
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_where(&self, predicate: &str, value: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE {} = $1",
            USER_COLUMNS, predicate
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_external_id(&self, external_id: &str) -> ServiceResult<Option<User>> {
        self.find_where("external_id", external_id).await
    }

    async fn find_by_handle(&self, handle: &str) -> ServiceResult<Option<User>> {
        self.find_where("handle", handle).await
    }

    async fn insert(&self, user: NewUser) -> ServiceResult<User> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, external_id, email, name, handle, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.handle)
        .bind(&user.image)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(ServiceError::Conflict(format!(
                "user with handle '{}' or this identity already exists",
                user.handle
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> ServiceResult<User> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = CASE WHEN $2 THEN $3::text ELSE name END,
                bio = CASE WHEN $4 THEN $5::text ELSE bio END,
                location = CASE WHEN $6 THEN $7::text ELSE location END,
                websites = COALESCE($8::text[], websites),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.name.is_some())
        .bind(changes.name.flatten())
        .bind(changes.bio.is_some())
        .bind(changes.bio.flatten())
        .bind(changes.location.is_some())
        .bind(changes.location.flatten())
        .bind(changes.websites)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| ServiceError::NotFound(format!("user {}", id)))
    }

    async fn profile_counts(&self, id: Uuid) -> ServiceResult<ProfileCounts> {
        let counts = sqlx::query_as::<_, ProfileCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follows WHERE followee_id = $1) AS follower_count,
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1) AS following_count,
                (SELECT COUNT(*) FROM posts WHERE author_id = $1) AS post_count
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn suggested(&self, viewer: Uuid, limit: i64) -> ServiceResult<Vec<SuggestedUser>> {
        let users = sqlx::query_as::<_, SuggestedUser>(
            r#"
            SELECT u.id, u.name, u.handle, u.image,
                   (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id) AS follower_count
            FROM users u
            WHERE u.id <> $1
              AND NOT EXISTS (
                  SELECT 1 FROM follows f
                  WHERE f.follower_id = $1 AND f.followee_id = u.id
              )
            ORDER BY random()
            LIMIT $2
            "#,
        )
        .bind(viewer)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
