// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the geomon geofencing SDK.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level geomon configuration.
///
/// Loaded from TOML files with environment variable overrides. All sections
/// are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeomonConfig {
    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Event/seen reporting settings.
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Geofence monitoring settings.
    #[serde(default)]
    pub monitoring: MonitoringConfig,
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
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("geomon").join("geomon.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("geomon.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Reporting pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportingConfig {
    /// Base URL of the backend reporting API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Application code sent as the Authorization credential.
    #[serde(default)]
    pub application_code: Option<String>,

    /// Quiet period of the debounced batcher, in milliseconds. A burst of
    /// triggers within this window collapses into one reporting round.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            application_code: None,
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.geomon.example.com".to_string()
}

fn default_batch_delay_ms() -> u64 {
    5000
}

/// Geofence monitoring configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonitoringConfig {
    /// Master switch for geofence monitoring.
    #[serde(default = "default_monitoring_enabled")]
    pub enabled: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: default_monitoring_enabled(),
        }
    }
}

fn default_monitoring_enabled() -> bool {
    true
}
