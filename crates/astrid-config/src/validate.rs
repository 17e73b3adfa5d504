//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_run(config)?;
    validate_permissions(config)?;
    validate_context(config)?;
    validate_logging(config)?;
    validate_retry(config)?;
    Ok(())
}

fn validate_run(config: &Config) -> ConfigResult<()> {
    let r = &config.run;

    if r.model.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "run.model".to_owned(),
            message: "model is required".to_owned(),
        });
    }

    if !(0.0..=1.0).contains(&r.temperature) {
        return Err(ConfigError::ValidationError {
            field: "run.temperature".to_owned(),
            message: format!(
                "temperature {} is out of range; must be between 0.0 and 1.0",
                r.temperature
            ),
        });
    }

    if r.max_iterations == 0 {
        return Err(ConfigError::ValidationError {
            field: "run.max_iterations".to_owned(),
            message: "max_iterations must be greater than 0".to_owned(),
        });
    }

    if r.max_execution_ms == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "run.max_execution_ms".to_owned(),
            message: "max_execution_ms must be greater than 0 when set".to_owned(),
        });
    }

    if r.max_tool_calls == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "run.max_tool_calls".to_owned(),
            message: "max_tool_calls must be greater than 0 when set".to_owned(),
        });
    }

    if r.max_input_messages == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "run.max_input_messages".to_owned(),
            message: "max_input_messages must be greater than 0 when set".to_owned(),
        });
    }

    if r.error_handling.max_consecutive_errors == 0 {
        return Err(ConfigError::ValidationError {
            field: "run.error_handling.max_consecutive_errors".to_owned(),
            message: "max_consecutive_errors must be greater than 0".to_owned(),
        });
    }

    Ok(())
}

fn validate_permissions(config: &Config) -> ConfigResult<()> {
    for (name, overrides) in &config.permissions.per_tool {
        if overrides.session_ttl_ms == Some(0) {
            return Err(ConfigError::ValidationError {
                field: format!("permissions.per_tool.{name}.session_ttl_ms"),
                message: "session_ttl_ms must be greater than 0 when set".to_owned(),
            });
        }
    }
    Ok(())
}

fn validate_context(config: &Config) -> ConfigResult<()> {
    let c = &config.context;

    for (field, value) in [
        ("context.warning_threshold", c.warning_threshold),
        ("context.rolling_threshold", c.rolling_threshold),
        ("context.tool_offload_threshold", c.tool_offload_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::ValidationError {
                field: field.to_owned(),
                message: format!("{value} is out of range; must be between 0.0 and 1.0"),
            });
        }
    }

    if c.tool_pair_cap == 0 {
        return Err(ConfigError::ValidationError {
            field: "context.tool_pair_cap".to_owned(),
            message: "tool_pair_cap must be greater than 0".to_owned(),
        });
    }

    Ok(())
}

fn validate_retry(config: &Config) -> ConfigResult<()> {
    let r = &config.retry;

    if r.llm_max_attempts == 0 {
        return Err(ConfigError::ValidationError {
            field: "retry.llm_max_attempts".to_owned(),
            message: "llm_max_attempts must be greater than 0".to_owned(),
        });
    }

    if r.tool_max_attempts == 0 {
        return Err(ConfigError::ValidationError {
            field: "retry.tool_max_attempts".to_owned(),
            message: "tool_max_attempts must be greater than 0".to_owned(),
        });
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    Ok(())
}
