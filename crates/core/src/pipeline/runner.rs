//! Pipeline driver: wire the stages together and wait for them to drain.

use tracing::info;

use crate::lifecycle::Lifecycle;
use crate::shutdown::ShutdownRx;

use super::config::PipelineConfig;
use super::context::StageContext;
use super::error::PipelineError;
use super::types::{Disposition, PipelineReport};
use super::{fill, reserve, sink, source, validate};

/// The order pipeline.
///
/// ```text
/// source -> validate -+-> reserve (xW) -> fill (xF) -+-> sink
///                     |                              |
///                     +--------- invalid ------------+
/// ```
#[derive(Debug, Clone)]
pub struct OrderPipeline {
    config: PipelineConfig,
}

impl OrderPipeline {
    /// Creates a new pipeline.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Returns the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs `records` through every stage.
    ///
    /// Returns once every stage task has exited. Cancelling `shutdown` stops
    /// the source; orders already in flight still drain to the sink.
    pub async fn run(
        &self,
        records: Vec<String>,
        shutdown: ShutdownRx,
    ) -> Result<PipelineReport, PipelineError> {
        self.check_config()?;

        let lifecycle = Lifecycle::new();
        let ctx = StageContext::new(lifecycle.clone(), shutdown, self.config.channel_capacity);

        info!(
            "Starting order pipeline: {} records, {} reservation workers, {} fill workers",
            records.len(),
            self.config.reservation_workers,
            self.config.fill_workers
        );

        let received = source::spawn(&ctx, records);
        let (valid, invalid) = validate::spawn(&ctx, received);
        let reserved = reserve::spawn(&ctx, self.config.reservation_workers, valid);
        let filled = fill::spawn(&ctx, self.config.fill_workers, reserved);
        let report_rx = sink::spawn(&ctx, filled, invalid);

        lifecycle.wait().await?;

        let observed = report_rx.await.map_err(|_| PipelineError::SinkLost)?;
        let mut report = PipelineReport {
            stats: ctx.stats.snapshot(),
            ..Default::default()
        };
        for disposition in observed {
            match disposition {
                Disposition::Filled { order } => report.filled.push(order),
                Disposition::Invalid { rejected } => report.invalid.push(rejected),
            }
        }

        info!(
            "Order pipeline drained: {} filled, {} invalid, {} unparsable",
            report.filled.len(),
            report.invalid.len(),
            report.stats.parse_failures
        );

        Ok(report)
    }

    fn check_config(&self) -> Result<(), PipelineError> {
        if self.config.reservation_workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "reservation_workers must be at least 1".to_string(),
            ));
        }
        if self.config.fill_workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "fill_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for OrderPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
