// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the contactd directory.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Every recognized `[section]` and its keys, in file order.
///
/// Diagnostics use this table for suggestions and for locating keys that
/// landed in the wrong section.
pub const SECTIONS: &[(&str, &[&str])] = &[
    ("service", &["name", "log_level"]),
    (
        "storage",
        &["database_path", "wal_mode", "busy_timeout_ms", "query_timeout_ms"],
    ),
    (
        "bus",
        &[
            "capacity",
            "publish_timeout_ms",
            "exchange",
            "domain_deleted_topic",
            "domain_deleted_queue",
        ],
    ),
];

/// Keys of one section, or `None` for an unrecognized section.
pub fn section_keys(section: &str) -> Option<&'static [&'static str]> {
    SECTIONS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, keys)| *keys)
}

/// Top-level contactd configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContactdConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Event bus and inbound subscription settings.
    #[serde(default)]
    pub bus: BusConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name reported in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "im-contact-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long SQLite waits on a locked database before failing, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Deadline for a single store operation in milliseconds. 0 disables it.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl StorageConfig {
    /// Storage config for a database at `path` with every other field defaulted.
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_ms > 0).then(|| Duration::from_millis(self.query_timeout_ms))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("contactd").join("contactd.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("contactd.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

/// Event bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Number of events buffered per subscriber before the slowest lags.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Deadline for handing one event to the transport, in milliseconds.
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Exchange the inbound subscriptions bind to.
    #[serde(default = "default_exchange")]
    pub exchange: String,

    /// Topic pattern of the upstream "tenant deleted" event.
    #[serde(default = "default_domain_deleted_topic")]
    pub domain_deleted_topic: String,

    /// Queue consuming the "tenant deleted" event.
    #[serde(default = "default_domain_deleted_queue")]
    pub domain_deleted_queue: String,
}

impl BusConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            publish_timeout_ms: default_publish_timeout_ms(),
            exchange: default_exchange(),
            domain_deleted_topic: default_domain_deleted_topic(),
            domain_deleted_queue: default_domain_deleted_queue(),
        }
    }
}

fn default_capacity() -> usize {
    1024
}

fn default_publish_timeout_ms() -> u64 {
    5_000
}

fn default_exchange() -> String {
    "webitel".to_string()
}

fn default_domain_deleted_topic() -> String {
    "domains.delete.#".to_string()
}

fn default_domain_deleted_queue() -> String {
    "im_contacts.domain_delete".to_string()
}
