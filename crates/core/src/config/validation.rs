//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_concurrency` is 0 or exceeds 256
    /// - `channel_capacity` is 0
    /// - `coordinate_precision` exceeds 12 decimal places
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrency".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_concurrency > 256 {
            return Err(ConfigError::Invalid { field: "max_concurrency".into(), reason: "must not exceed 256".into() });
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "channel_capacity".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.coordinate_precision > 12 {
            return Err(ConfigError::Invalid {
                field: "coordinate_precision".into(),
                reason: "must not exceed 12 decimal places".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.fetch_interval_ms == 0 {
            tracing::warn!("fetch_interval_ms is 0; page downloads will not be throttled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = AppConfig { max_concurrency: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_concurrency"));
    }

    #[test]
    fn test_validate_concurrency_exceeds_limit() {
        let config = AppConfig { max_concurrency: 257, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_concurrency"));
    }

    #[test]
    fn test_validate_zero_channel_capacity() {
        let config = AppConfig { channel_capacity: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "channel_capacity"));
    }

    #[test]
    fn test_validate_precision_too_large() {
        let config = AppConfig { coordinate_precision: 13, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "coordinate_precision"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            timeout_ms: 100,
            max_concurrency: 1,
            channel_capacity: 1,
            coordinate_precision: 0,
            fetch_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
