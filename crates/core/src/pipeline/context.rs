use std::sync::Arc;

use crate::lifecycle::Lifecycle;
use crate::shutdown::ShutdownRx;

use super::types::PipelineStats;

/// Everything a stage needs to launch its tasks.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Coordinator every stage task registers with.
    pub lifecycle: Lifecycle,
    /// Per-run counters.
    pub stats: Arc<PipelineStats>,
    /// Cancellation signal observed by the source stage.
    pub shutdown: ShutdownRx,
    /// Buffer size for conduits created by the stage.
    pub capacity: usize,
}

impl StageContext {
    pub fn new(lifecycle: Lifecycle, shutdown: ShutdownRx, capacity: usize) -> Self {
        Self {
            lifecycle,
            stats: Arc::new(PipelineStats::default()),
            shutdown,
            capacity: capacity.max(1),
        }
    }
}
