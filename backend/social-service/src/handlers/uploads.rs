use super::ApiResponse;
use crate::error::ServiceError;
use crate::services::MAX_IMAGE_BYTES;
use crate::state::AppState;
use actix_middleware::MaybePrincipal;
use actix_web::{http::header, web, HttpRequest, HttpResponse};

/// Request bodies above this are cut off by actix with 413
pub const UPLOAD_PAYLOAD_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

/// Raw image body; the `Content-Type` header names the format
///
/// POST /api/v1/uploads/post-image
pub async fn upload_post_image(
    state: web::Data<AppState>,
    principal: MaybePrincipal,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ServiceError> {
    let uploader_id = state
        .identity
        .require_current_user(principal.as_ref())
        .await?;

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServiceError::Validation("Content-Type header is required".to_string()))?;

    let upload = state
        .media
        .upload_post_image(uploader_id, content_type, body.to_vec())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(upload)))
}
