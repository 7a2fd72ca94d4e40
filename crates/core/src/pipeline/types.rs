//! Types for the pipeline module.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::metrics;
use crate::order::{InvalidOrder, Order};

/// Per-run counters shared by the stages.
///
/// Each counter is only ever incremented; readers take a snapshot.
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    parse_failures: AtomicU64,
    valid: AtomicU64,
    invalid: AtomicU64,
    reserved: AtomicU64,
    filled: AtomicU64,
}

impl PipelineStats {
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        metrics::ORDERS_RECEIVED.inc();
    }

    pub(crate) fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
        metrics::PARSE_FAILURES.inc();
    }

    pub(crate) fn record_valid(&self) {
        self.valid.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
        metrics::ORDERS_INVALID.inc();
    }

    pub(crate) fn record_reserved(&self) {
        self.reserved.fetch_add(1, Ordering::Relaxed);
        metrics::STATUS_TRANSITIONS
            .with_label_values(&["reserved"])
            .inc();
    }

    pub(crate) fn record_filled(&self) {
        self.filled.fetch_add(1, Ordering::Relaxed);
        metrics::STATUS_TRANSITIONS.with_label_values(&["filled"]).inc();
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            reserved: self.reserved.load(Ordering::Relaxed),
            filled: self.filled.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`PipelineStats`] at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Orders decoded and emitted by the source stage.
    pub received: u64,
    /// Raw records dropped as malformed.
    pub parse_failures: u64,
    /// Orders that passed validation.
    pub valid: u64,
    /// Orders rejected by validation.
    pub invalid: u64,
    /// Received -> Reserved transitions applied.
    pub reserved: u64,
    /// Reserved -> Filled transitions applied.
    pub filled: u64,
}

/// Terminal disposition of an order as observed by the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Disposition {
    /// Passed every stage.
    Filled { order: Order },
    /// Rejected by validation.
    Invalid { rejected: InvalidOrder },
}

impl Disposition {
    /// Product code of the order this disposition is about.
    pub fn product_code(&self) -> i64 {
        match self {
            Disposition::Filled { order } => order.product_code,
            Disposition::Invalid { rejected } => rejected.order.product_code,
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Orders that reached the success sink.
    pub filled: Vec<Order>,
    /// Orders that reached the invalid sink.
    pub invalid: Vec<InvalidOrder>,
    /// Stage counters at the end of the run.
    pub stats: StatsSnapshot,
}

impl PipelineReport {
    /// Number of orders observed by either terminal consumer.
    pub fn terminal_events(&self) -> usize {
        self.filled.len() + self.invalid.len()
    }

    /// Raw records dropped by the source stage.
    pub fn parse_failures(&self) -> u64 {
        self.stats.parse_failures
    }
}
