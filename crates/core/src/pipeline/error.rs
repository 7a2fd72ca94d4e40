//! Error types for the pipeline module.

use thiserror::Error;

use crate::lifecycle::TaskFailure;

/// Structural failures of the pipeline.
///
/// Data problems (unparsable records, failed validation) never show up here;
/// they are routed as values. These variants indicate broken wiring.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage's downstream conduit was dropped while it still had output.
    #[error("Downstream conduit of stage '{stage}' closed while items were pending")]
    ConduitClosed { stage: &'static str },

    /// A tracked task failed or panicked.
    #[error("Pipeline task failed: {0}")]
    Task(#[from] TaskFailure),

    /// The sink finished without handing back its report.
    #[error("Sink exited without producing a report")]
    SinkLost,

    /// The configuration cannot drive a pipeline.
    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    pub(crate) fn closed(stage: &'static str) -> Self {
        PipelineError::ConduitClosed { stage }
    }
}
