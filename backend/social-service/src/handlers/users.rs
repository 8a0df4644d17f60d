use super::ApiResponse;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_middleware::{MaybePrincipal, Principal};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

/// Create the caller's user on first sign-in
///
/// POST /api/v1/users/sync
pub async fn sync_user(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, ServiceError> {
    let user = state.identity.sync_identity(&principal).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

/// GET /api/v1/users/me
pub async fn current_user(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<HttpResponse, ServiceError> {
    let user = state.identity.current_user(&principal).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

/// GET /api/v1/users/suggestions
pub async fn suggested_users(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
) -> Result<HttpResponse, ServiceError> {
    let viewer = state.identity.viewer(principal.as_ref()).await?;
    let users = state.profiles.suggested_users(viewer).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}

#[derive(Debug, Serialize)]
struct FollowingStatus {
    following: bool,
}

/// Whether the caller follows `{id}`; always false for anonymous callers
///
/// GET /api/v1/users/{id}/following
pub async fn is_following(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let target_id = path.into_inner();
    let following = match state.identity.viewer(principal.as_ref()).await? {
        Some(viewer) => state.relationships.is_following(viewer, target_id).await?,
        None => false,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(FollowingStatus { following })))
}

/// POST /api/v1/users/{id}/follow
pub async fn toggle_follow(
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
        .toggle_follow(actor_id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(result)))
}
