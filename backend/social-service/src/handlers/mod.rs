//! HTTP surface under `/api/v1`
//!
//! Handlers resolve the caller, run one service operation and wrap the
//! result in [`ApiResponse`]. Errors render through `ServiceError`.

pub mod health;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod uploads;
pub mod users;

use actix_web::web;
use serde::Serialize;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<crate::error::ErrorBody>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Register all API routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/users")
                    .route("/sync", web::post().to(users::sync_user))
                    .route("/me", web::get().to(users::current_user))
                    .route("/suggestions", web::get().to(users::suggested_users))
                    .route("/{id}/following", web::get().to(users::is_following))
                    .route("/{id}/follow", web::post().to(users::toggle_follow)),
            )
            .service(
                web::scope("/profiles")
                    .route("/{handle}", web::get().to(profiles::get_profile))
                    .route("/{handle}/posts", web::get().to(profiles::author_posts))
                    .route("/{handle}/likes", web::get().to(profiles::liked_posts)),
            )
            .route("/profile", web::patch().to(profiles::update_profile))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/like", web::post().to(posts::toggle_like))
                    .route("/{id}/comments", web::post().to(posts::create_comment)),
            )
            .service(
                web::scope("/notifications")
                    .route("", web::get().to(notifications::list_notifications))
                    .route("/read", web::post().to(notifications::mark_read)),
            )
            .route(
                "/uploads/post-image",
                web::post().to(uploads::upload_post_image),
            ),
    );
}

/// Health, readiness and metrics endpoints
pub fn register_ops_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .route("/ready", web::get().to(health::ready))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics));
}

/// JSON body errors render as `VALIDATION` envelopes
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        crate::error::ServiceError::Validation(err.to_string()).into()
    })
}

/// Malformed path parameters (e.g. a non-UUID id) render as `VALIDATION` envelopes
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        crate::error::ServiceError::Validation(err.to_string()).into()
    })
}

/// Body limit for raw uploads, a little above the image limit
pub fn payload_config() -> web::PayloadConfig {
    web::PayloadConfig::new(uploads::UPLOAD_PAYLOAD_LIMIT)
}
