use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, register_int_gauge, Encoder, IntCounterVec, IntGauge, TextEncoder};

// Prometheus metrics (default registry)
pub static OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "user_registry_operations_total",
        "User store operations by name and outcome",
        &["operation", "outcome"]
    )
    .expect("register operations_total")
});

pub static USERS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("user_registry_users", "Users currently held in the store")
        .expect("register users gauge")
});

/// Count one store operation. `ok = false` means the id was not found.
pub fn record_operation(operation: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "not_found" };
    OPERATIONS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

pub fn set_user_count(count: usize) {
    USERS.set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn encode_metrics() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
