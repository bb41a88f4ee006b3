// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the contactd directory.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use contactd_config::load_and_validate;
//!
//! match load_and_validate() {
//!     Ok(config) => println!("database: {}", config.storage.database_path),
//!     Err(errors) => contactd_config::render_errors(&errors),
//! }
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{BusConfig, ContactdConfig, ServiceConfig, StorageConfig};

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error the TOML sources are re-read so diagnostics can point
/// at the offending key.
pub fn load_and_validate() -> Result<ContactdConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources();
            Err(diagnostic::from_figment(err, &toml_sources))
        }
    }
}

/// Load configuration from one explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<ContactdConfig, Vec<ConfigError>> {
    if !path.exists() {
        return Err(vec![ConfigError::Other(format!(
            "config file `{}` does not exist",
            path.display()
        ))]);
    }
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::from_figment(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ContactdConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![(
                diagnostic::INLINE_SOURCE.to_string(),
                toml_content.to_string(),
            )];
            Err(diagnostic::from_figment(err, &sources))
        }
    }
}

fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Ok(content) = std::fs::read_to_string(loader::LOCAL_CONFIG_PATH) {
        let path = std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_PATH).display().to_string())
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_PATH.to_string());
        sources.push((path, content));
    }

    let user_path = loader::user_config_path();
    if let Ok(content) = std::fs::read_to_string(&user_path) {
        sources.push((user_path.display().to_string(), content));
    }

    if let Ok(content) = std::fs::read_to_string(loader::SYSTEM_CONFIG_PATH) {
        sources.push((loader::SYSTEM_CONFIG_PATH.to_string(), content));
    }

    sources
}
