use super::PostRepository;
use crate::domain::{AuthorSummary, CommentView, NewPost, Post, PostFilter, PostView};
use crate::error::ServiceResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// Repository for Post operations
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    content: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    author_name: Option<String>,
    author_handle: String,
    author_image: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
    author_id: Uuid,
    author_name: Option<String>,
    author_handle: String,
    author_image: Option<String>,
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    post_id: Uuid,
    user_id: Uuid,
}

/// Attach comments and likers to post rows, keeping row order
fn assemble(posts: Vec<PostRow>, comments: Vec<CommentRow>, likes: Vec<LikeRow>) -> Vec<PostView> {
    let mut comments_by_post: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for row in comments {
        comments_by_post
            .entry(row.post_id)
            .or_default()
            .push(CommentView {
                id: row.id,
                content: row.content,
                created_at: row.created_at,
                author: AuthorSummary {
                    id: row.author_id,
                    name: row.author_name,
                    handle: row.author_handle,
                    image: row.author_image,
                },
            });
    }

    let mut likers_by_post: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in likes {
        likers_by_post.entry(row.post_id).or_default().push(row.user_id);
    }

    posts
        .into_iter()
        .map(|row| {
            let comments = comments_by_post.remove(&row.id).unwrap_or_default();
            let liker_ids = likers_by_post.remove(&row.id).unwrap_or_default();
            PostView {
                id: row.id,
                content: row.content,
                image: row.image,
                created_at: row.created_at,
                author: AuthorSummary {
                    id: row.author_id,
                    name: row.author_name,
                    handle: row.author_handle,
                    image: row.author_image,
                },
                comment_count: comments.len() as i64,
                like_count: liker_ids.len() as i64,
                comments,
                liker_ids,
                has_liked: false,
            }
        })
        .collect()
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find(&self, id: Uuid) -> ServiceResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, author_id, content, image, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn insert(&self, post: NewPost) -> ServiceResult<Post> {
        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, content, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, content, image, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post.author_id)
        .bind(&post.content)
        .bind(&post.image)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        // comments, likes and notifications go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: PostFilter) -> ServiceResult<Vec<PostView>> {
        let (author_id, liked_by) = match filter {
            PostFilter::All => (None, None),
            PostFilter::ByAuthor(author) => (Some(author), None),
            PostFilter::LikedBy(user) => (None, Some(user)),
        };

        let posts = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT p.id, p.content, p.image, p.created_at,
                   u.id AS author_id, u.name AS author_name,
                   u.handle AS author_handle, u.image AS author_image
            FROM posts p
            JOIN users u ON u.id = p.author_id
            WHERE ($1::uuid IS NULL OR p.author_id = $1)
              AND ($2::uuid IS NULL OR EXISTS (
                  SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $2
              ))
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(author_id)
        .bind(liked_by)
        .fetch_all(&self.pool)
        .await?;

        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.post_id, c.content, c.created_at,
                   u.id AS author_id, u.name AS author_name,
                   u.handle AS author_handle, u.image AS author_image
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ANY($1)
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        let likes = sqlx::query_as::<_, LikeRow>(
            r#"
            SELECT post_id, user_id
            FROM likes
            WHERE post_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble(posts, comments, likes))
    }
}
