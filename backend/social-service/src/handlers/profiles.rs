use super::ApiResponse;
use crate::domain::UpdateProfile;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_middleware::MaybePrincipal;
use actix_web::{web, HttpResponse};

/// GET /api/v1/profiles/{handle}
pub async fn get_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let profile = state.profiles.get_profile(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(profile)))
}

/// GET /api/v1/profiles/{handle}/posts
pub async fn author_posts(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let viewer = state.identity.viewer(principal.as_ref()).await?;
    let posts = state.profiles.list_author_posts(&path, viewer).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/v1/profiles/{handle}/likes
pub async fn liked_posts(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let viewer = state.identity.viewer(principal.as_ref()).await?;
    let posts = state.profiles.list_liked_posts(&path, viewer).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// PATCH /api/v1/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    req: web::Json<UpdateProfile>,
) -> Result<HttpResponse, ServiceError> {
    let actor_id = state
        .identity
        .require_current_user(principal.as_ref())
        .await?;
    let user = state
        .profiles
        .update_profile(actor_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}
