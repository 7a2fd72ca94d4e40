//! Prometheus metrics for the order pipeline.
//!
//! Counters are process-wide and accumulate across pipeline runs. Per-run
//! numbers live in [`crate::pipeline::PipelineStats`].

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Orders decoded by the source stage.
pub static ORDERS_RECEIVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orderflow_orders_received_total",
        "Total orders decoded by the source stage",
    )
    .unwrap()
});

/// Raw records dropped because they could not be decoded.
pub static PARSE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orderflow_parse_failures_total",
        "Total raw records that failed to decode",
    )
    .unwrap()
});

/// Orders rejected by validation.
pub static ORDERS_INVALID: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "orderflow_orders_invalid_total",
        "Total orders rejected by validation",
    )
    .unwrap()
});

/// Status transitions applied by the worker pools.
pub static STATUS_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "orderflow_status_transitions_total",
            "Total order status transitions",
        ),
        &["status"], // "reserved", "filled"
    )
    .unwrap()
});

// =============================================================================
// Ticker Metrics
// =============================================================================

/// Ticks emitted by periodic tasks.
pub static TICKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("orderflow_ticks_total", "Total ticks emitted by periodic tasks").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

/// Register all metrics with the given registry.
pub fn register_metrics(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(ORDERS_RECEIVED.clone()))?;
    registry.register(Box::new(PARSE_FAILURES.clone()))?;
    registry.register(Box::new(ORDERS_INVALID.clone()))?;
    registry.register(Box::new(STATUS_TRANSITIONS.clone()))?;
    registry.register(Box::new(TICKS.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();

        STATUS_TRANSITIONS.with_label_values(&["reserved"]).inc();

        let families = registry.gather();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert!(names.contains(&"orderflow_status_transitions_total"));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        register_metrics(&registry).unwrap();
        assert!(register_metrics(&registry).is_err());
    }
}
