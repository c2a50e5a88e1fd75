use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Queue admits at least one job
/// - Tool timeouts and the janitor interval are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.queue.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "queue.max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.tools.standard_timeout_secs == 0 || config.tools.extended_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "tools timeouts must be greater than 0".to_string(),
        ));
    }

    if config.janitor.enabled && config.janitor.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "janitor.interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
