// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key/value flags.

use geomon_core::GeomonError;
use rusqlite::params;

use crate::database::Database;

/// Key of the "all currently active geo areas are monitored" flag.
pub const MONITORING_ACTIVE: &str = "monitoring_active";

/// Read a boolean flag; missing keys read as `false`.
pub async fn get_bool(db: &Database, key: &'static str) -> Result<bool, GeomonError> {
    db.connection()
        .call(move |conn| {
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM prefs WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(value.as_deref() == Some("true"))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist a boolean flag.
pub async fn set_bool(db: &Database, key: &'static str, value: bool) -> Result<(), GeomonError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO prefs (key, value) VALUES (?1, ?2)",
                params![key, if value { "true" } else { "false" }],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
