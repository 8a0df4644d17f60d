//! Pool gauges and acquire instrumentation

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

lazy_static::lazy_static! {
    static ref POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Connections held by the pool, split into in_use, idle and capacity",
        &["service", "state"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref POOL_WAIT: HistogramVec = register_histogram_vec!(
        "db_pool_wait_seconds",
        "Time a caller waited for a pooled connection",
        &["service"],
        vec![0.0005, 0.002, 0.01, 0.025, 0.1, 0.25, 1.0, 3.0]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref POOL_ACQUIRE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "db_pool_acquire_failures_total",
        "Failed connection checkouts by reason",
        &["service", "reason"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// Point-in-time view of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolSnapshot {
    pub capacity: u32,
    pub open: u32,
    pub idle: usize,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            capacity: pool.options().get_max_connections(),
            open: pool.size(),
            idle: pool.num_idle(),
        }
    }

    /// Idle count is read separately from size and can briefly exceed it.
    pub fn in_use(&self) -> i64 {
        (i64::from(self.open) - self.idle as i64).max(0)
    }

    fn publish(&self, service: &str) {
        let gauges = [
            ("in_use", self.in_use()),
            ("idle", self.idle as i64),
            ("capacity", i64::from(self.capacity)),
        ];
        for (state, value) in gauges {
            POOL_CONNECTIONS.with_label_values(&[service, state]).set(value);
        }
    }
}

pub(crate) fn record_snapshot(pool: &PgPool, service: &str) {
    PoolSnapshot::of(pool).publish(service);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcquireFailure {
    Timeout,
    Closed,
    Other,
}

impl AcquireFailure {
    fn classify(err: &sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::Timeout,
            sqlx::Error::PoolClosed => Self::Closed,
            _ => Self::Other,
        }
    }

    fn reason(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Closed => "closed",
            Self::Other => "other",
        }
    }
}

/// Checks a connection out of `pool`, recording the wait time and any failure.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let started = Instant::now();
    let checkout = pool.acquire().await;
    POOL_WAIT
        .with_label_values(&[service])
        .observe(started.elapsed().as_secs_f64());

    checkout.map_err(|err| {
        let failure = AcquireFailure::classify(&err);
        POOL_ACQUIRE_FAILURES
            .with_label_values(&[service, failure.reason()])
            .inc();
        err
    })
}
