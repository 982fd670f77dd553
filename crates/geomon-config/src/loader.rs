// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./geomon.toml` > `~/.config/geomon/geomon.toml` >
//! `/etc/geomon/geomon.toml` with environment variable overrides via the
//! `GEOMON_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::GeomonConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/geomon/geomon.toml` (system-wide)
/// 3. `~/.config/geomon/geomon.toml` (user XDG config)
/// 4. `./geomon.toml` (local directory)
/// 5. `GEOMON_*` environment variables
pub fn load_config() -> Result<GeomonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GeomonConfig::default()))
        .merge(Toml::file("/etc/geomon/geomon.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("geomon/geomon.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("geomon.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GeomonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GeomonConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GeomonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GeomonConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `GEOMON_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("GEOMON_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("storage_", "storage.", 1)
            .replacen("reporting_", "reporting.", 1)
            .replacen("monitoring_", "monitoring.", 1);
        mapped.into()
    })
}
