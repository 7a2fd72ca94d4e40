//! Concurrent order pipeline.
//!
//! Stages run as independent tasks connected by bounded conduits
//! (`tokio::sync::mpsc`). Each stage owns its output conduit and closes it
//! (by dropping the sender) once its input is exhausted:
//!
//! - **source**: decodes raw JSON records into received orders
//! - **validate**: routes orders to a valid or an invalid conduit
//! - **reserve**: worker pool marking orders reserved
//! - **fill**: worker pool marking orders filled
//! - **sink**: multiplexed drain of the filled and invalid conduits
//!
//! Every task is registered with a [`crate::lifecycle::Lifecycle`] before it
//! is launched; [`OrderPipeline::run`] returns only after all have exited.
//!
//! # Example
//!
//! ```ignore
//! use orderflow_core::pipeline::{OrderPipeline, PipelineConfig};
//! use orderflow_core::shutdown;
//!
//! let (shutdown_tx, shutdown_rx) = shutdown::channel();
//! let pipeline = OrderPipeline::new(PipelineConfig::default());
//! let report = pipeline.run(records, shutdown_rx).await?;
//! println!("{} filled, {} invalid", report.filled.len(), report.invalid.len());
//! ```

mod config;
mod context;
mod error;
pub mod fill;
pub mod pool;
pub mod reserve;
mod runner;
pub mod sink;
pub mod source;
mod types;
pub mod validate;

pub use config::PipelineConfig;
pub use context::StageContext;
pub use error::PipelineError;
pub use pool::StatusTransition;
pub use runner::OrderPipeline;
pub use types::{Disposition, PipelineReport, PipelineStats, StatsSnapshot};
