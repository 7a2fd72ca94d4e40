use serde::{Deserialize, Serialize};

use crate::database::DatabaseConfig;
use crate::pipeline::PipelineConfig;
use crate::ticker::TickerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Raw order records fed to the source stage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// One JSON object per record.
    #[serde(default = "default_records")]
    pub records: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            records: default_records(),
        }
    }
}

fn default_records() -> Vec<String> {
    [
        r#"{"productCode":1111, "quantity":5, "status":1}"#,
        r#"{"productCode":2222, "quantity":42.3, "status":1}"#,
        r#"{"productCode":3333, "quantity":19, "status":1}"#,
        r#"{"productCode":444, "quantity":-19, "status":1}"#,
    ]
    .iter()
    .map(|r| r.to_string())
    .collect()
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Print the Prometheus text exposition on exit.
    #[serde(default)]
    pub dump: bool,
}
