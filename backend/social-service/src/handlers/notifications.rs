use super::ApiResponse;
use crate::error::ServiceError;
use crate::state::AppState;
use actix_middleware::MaybePrincipal;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct MarkReadResponse {
    updated: u64,
}

/// GET /api/v1/notifications
pub async fn list_notifications(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
) -> Result<HttpResponse, ServiceError> {
    let recipient = state.identity.viewer(principal.as_ref()).await?;
    let notifications = state.notifications.list_notifications(recipient).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(notifications)))
}

/// POST /api/v1/notifications/read
pub async fn mark_read(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    req: web::Json<MarkReadRequest>,
) -> Result<HttpResponse, ServiceError> {
    let recipient_id = state
        .identity
        .require_current_user(principal.as_ref())
        .await?;
    let updated = state.notifications.mark_read(recipient_id, &req.ids).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(MarkReadResponse { updated })))
}
