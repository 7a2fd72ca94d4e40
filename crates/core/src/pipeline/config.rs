//! Configuration for the order pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for the order pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent reservation workers.
    #[serde(default = "default_reservation_workers")]
    pub reservation_workers: usize,

    /// Number of concurrent fill workers.
    #[serde(default = "default_fill_workers")]
    pub fill_workers: usize,

    /// Buffer size of every conduit between stages.
    /// Small values keep the stages close to lock-step.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_reservation_workers() -> usize {
    3
}

fn default_fill_workers() -> usize {
    1
}

fn default_channel_capacity() -> usize {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reservation_workers: default_reservation_workers(),
            fill_workers: default_fill_workers(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl PipelineConfig {
    /// Sets the number of reservation workers.
    pub fn with_reservation_workers(mut self, workers: usize) -> Self {
        self.reservation_workers = workers;
        self
    }

    /// Sets the number of fill workers.
    pub fn with_fill_workers(mut self, workers: usize) -> Self {
        self.fill_workers = workers;
        self
    }

    /// Sets the conduit buffer size.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}
