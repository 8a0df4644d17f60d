use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Ready once the database answers; the memory backend is always ready
pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    let Some(pool) = &state.pool else {
        return HttpResponse::Ok().body("READY");
    };

    match db_pool::acquire_with_metrics(pool, "social-service").await {
        Ok(_conn) => HttpResponse::Ok().body("READY"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().body("NOT READY")
        }
    }
}
