use super::ApiResponse;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_middleware::MaybePrincipal;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: Option<String>,
    /// URL returned by the image upload endpoint
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: bool,
}

/// Timeline, newest first
///
/// GET /api/v1/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
) -> Result<HttpResponse, ServiceError> {
    let viewer = state.identity.viewer(principal.as_ref()).await?;
    let posts = state.content.list_posts(viewer).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// POST /api/v1/posts
pub async fn create_post(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, ServiceError> {
    let author_id = state
        .identity
        .require_current_user(principal.as_ref())
        .await?;
    let req = req.into_inner();
    let post = state
        .content
        .create_post(author_id, req.content, req.image)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(post)))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let requester_id = state
        .identity
        .require_current_user(principal.as_ref())
        .await?;
    state
        .content
        .delete_post(requester_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(Deleted { deleted: true })))
}

/// POST /api/v1/posts/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let actor_id = state
        .identity
        .require_current_user(principal.as_ref())
        .await?;
    let result = state
        .relationships
        .toggle_like(actor_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(result)))
}

/// POST /api/v1/posts/{id}/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    path: web::Path<Uuid>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let author_id = state
        .identity
        .require_current_user(principal.as_ref())
        .await?;
    let comment = state
        .content
        .create_comment(author_id, path.into_inner(), &req.content)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(comment)))
}
