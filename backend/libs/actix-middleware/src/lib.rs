//! # Actix Middleware Library
//!
//! Middleware shared by the social backend's actix-web services
//!
//! ## Modules
//! - `principal`: bearer JWT verification, exposes the caller's external principal
//! - `correlation_id`: `x-correlation-id` propagation
//! - `logging`: one structured log line per request
//! - `metrics`: Prometheus request counters and latency histograms
//!
//! ## Ordering
//! actix runs the last `.wrap()` first, so register `CorrelationIdMiddleware`
//! after `Logging` for the id to show up in request logs.

pub mod correlation_id;
pub mod logging;
pub mod metrics;
pub mod principal;

pub use correlation_id::{CorrelationId, CorrelationIdMiddleware};
pub use logging::Logging;
pub use metrics::MetricsMiddleware;
pub use principal::{
    AuthError, MaybePrincipal, Principal, PrincipalMiddleware, PrincipalVerifier, Unauthorized,
};
