pub mod config;
pub mod database;
pub mod lifecycle;
pub mod metrics;
pub mod order;
pub mod pipeline;
pub mod shutdown;
pub mod ticker;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, InputConfig,
    LoggingConfig, MetricsConfig,
};
pub use database::{Database, DatabaseConfig, DatabaseError, InitGuard};
pub use lifecycle::{Lifecycle, TaskFailure};
pub use metrics::register_metrics;
pub use order::{InvalidOrder, Order, OrderStatus, RawOrder, RecordError, INVALID_QUANTITY_REASON};
pub use pipeline::{
    Disposition, OrderPipeline, PipelineConfig, PipelineError, PipelineReport, StatsSnapshot,
};
pub use shutdown::{ShutdownRx, ShutdownTx};
pub use ticker::{Tick, TickerConfig};
