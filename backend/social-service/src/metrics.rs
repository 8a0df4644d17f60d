use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

use crate::domain::NotificationKind;

static TOGGLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "social_toggles_total",
            "Follow and like toggles by resulting state",
        ),
        &["relation", "outcome"],
    )
    .expect("failed to create social_toggles_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register social_toggles_total");
    counter
});

static NOTIFICATIONS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "social_notifications_created_total",
            "Notifications fanned out from follows, likes and comments",
        ),
        &["kind"],
    )
    .expect("failed to create social_notifications_created_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register social_notifications_created_total");
    counter
});

/// Relation a toggle applies to
#[derive(Debug, Clone, Copy)]
pub enum Relation {
    Follow,
    Like,
}

impl Relation {
    fn as_str(&self) -> &'static str {
        match self {
            Relation::Follow => "follow",
            Relation::Like => "like",
        }
    }
}

/// `active` is the state after the toggle
pub fn record_toggle(relation: Relation, active: bool) {
    let outcome = if active { "created" } else { "removed" };
    TOGGLES_TOTAL
        .with_label_values(&[relation.as_str(), outcome])
        .inc();
}

pub fn record_notification(kind: NotificationKind) {
    NOTIFICATIONS_CREATED_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
