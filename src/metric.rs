use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("wpp_bridge_statds")
        .with_description("WhatsApp bridge statistics")
        .with_unit("request")
        .build()
});

fn incr_statds(attributes: &[KeyValue]) {
    STATDS.add(1, attributes);
}

/// Counts an operation outcome: "success", "rejected" or "error"
pub fn incr_operation_statds(operation: &str, outcome: &str) {
    incr_statds(&[
        KeyValue::new("operation", operation.to_string()),
        KeyValue::new("outcome", outcome.to_string()),
    ])
}

pub fn incr_auth_statds(outcome: &str) {
    incr_statds(&[KeyValue::new("auth", outcome.to_string())])
}
