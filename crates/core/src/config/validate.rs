use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Worker pools have at least one worker
/// - Conduits have a non-zero buffer
/// - Ticker interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pipeline.reservation_workers == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.reservation_workers cannot be 0".to_string(),
        ));
    }

    if config.pipeline.fill_workers == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.fill_workers cannot be 0".to_string(),
        ));
    }

    if config.pipeline.channel_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.channel_capacity cannot be 0".to_string(),
        ));
    }

    if config.ticker.enabled && config.ticker.interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "ticker.interval_ms cannot be 0".to_string(),
        ));
    }

    Ok(())
}
