// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ContactdConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ContactdConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.service.name.trim().is_empty() {
        errors.push(ConfigError::invalid("service.name", "must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::invalid(
            "service.log_level",
            format!(
                "`{}` is not one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if config.bus.capacity == 0 {
        errors.push(ConfigError::invalid("bus.capacity", "must be at least 1"));
    }

    if config.bus.publish_timeout_ms == 0 {
        errors.push(ConfigError::invalid(
            "bus.publish_timeout_ms",
            "must be at least 1",
        ));
    }

    for (key, value) in [
        ("bus.exchange", &config.bus.exchange),
        ("bus.domain_deleted_topic", &config.bus.domain_deleted_topic),
        ("bus.domain_deleted_queue", &config.bus.domain_deleted_queue),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::invalid(key, "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
