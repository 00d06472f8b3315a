use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::LazyLock;

pub static REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "credpay_requests_total",
        "Total HTTP requests on paid routes",
        &["endpoint", "status"]
    )
    .unwrap()
});

pub static CHALLENGES: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "credpay_challenges_total",
        "Payment challenges issued to callers without a proof"
    )
    .unwrap()
});

pub static SETTLEMENTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "credpay_settlements_total",
        "Proof validations by result",
        &["result"]
    )
    .unwrap()
});

pub static DELEGATED_PAYMENTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "credpay_delegated_payments_total",
        "Delegated payments by relayed status",
        &["status"]
    )
    .unwrap()
});

pub static SETTLEMENT_LATENCY: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "credpay_settlement_latency_seconds",
        "Settlement provider call latency",
        &["operation"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
