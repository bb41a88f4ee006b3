// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./contactd.toml` > `~/.config/contactd/contactd.toml`
//! > `/etc/contactd/contactd.toml` with environment variable overrides via the
//! `CONTACTD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Data, Env, Format, Serialized, Toml},
};

use tracing::debug;

use crate::model::ContactdConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/contactd/contactd.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "contactd.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("contactd/contactd.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/contactd/contactd.toml` (system-wide)
/// 3. `~/.config/contactd/contactd.toml` (user XDG config)
/// 4. `./contactd.toml` (local directory)
/// 5. `CONTACTD_*` environment variables
pub fn load_config() -> Result<ContactdConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ContactdConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ContactdConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ContactdConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ContactdConfig::default()))
        .merge(file_layer(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ContactdConfig::default()))
        .merge(file_layer(Path::new(SYSTEM_CONFIG_PATH)))
        .merge(file_layer(&user_config_path()))
        .merge(file_layer(Path::new(LOCAL_CONFIG_PATH)))
        .merge(env_provider())
}

/// A TOML file layer. Missing files contribute nothing.
fn file_layer(path: &Path) -> Data<Toml> {
    if path.is_file() {
        debug!(path = %path.display(), "merging config file");
    } else {
        debug!(path = %path.display(), "config file not present, skipping");
    }
    Toml::file(path)
}

/// Maps a lowercased, prefix-stripped env var name to a dotted config key.
///
/// Only the first underscore after a section name becomes a dot, so
/// `CONTACTD_STORAGE_DATABASE_PATH` maps to `storage.database_path`.
pub fn env_key(key: &str) -> String {
    for section in ["service", "storage", "bus"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("CONTACTD_").map(|key| env_key(key.as_str()).into())
}
