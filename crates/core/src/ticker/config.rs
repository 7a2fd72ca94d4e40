//! Ticker configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the periodic ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Whether the runner starts the ticker at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Time between ticks (milliseconds).
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    /// How long the runner lets the ticker run before cancelling it (milliseconds).
    #[serde(default = "default_run_for")]
    pub run_for_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    500
}

fn default_run_for() -> u64 {
    2000 // 2 seconds
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_interval(),
            run_for_ms: default_run_for(),
        }
    }
}
