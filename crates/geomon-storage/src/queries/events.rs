// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unreported event queue operations.
//!
//! The queue is append-only until a reporting round confirms delivery;
//! multiple producers may append concurrently while the single reporting
//! consumer snapshots and removes rows. All mutations go through the
//! single-writer connection, so queue updates are atomic with respect to
//! campaign-set updates.

use geomon_core::types::GeoReport;
use geomon_core::GeomonError;
use rusqlite::params;

use crate::database::Database;

/// Append reports to the queue. Re-appending a report with an already-queued
/// SDK message id is ignored, keeping producers idempotent.
pub async fn add(db: &Database, reports: &[GeoReport]) -> Result<(), GeomonError> {
    let reports = reports.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for report in &reports {
                let payload = serde_json::to_string(report)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                tx.execute(
                    "INSERT OR IGNORE INTO unreported_events (message_id, payload)
                     VALUES (?1, ?2)",
                    params![report.message_id, payload],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Snapshot the entire queue in append order without removing anything.
pub async fn snapshot(db: &Database) -> Result<Vec<GeoReport>, GeomonError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT payload FROM unreported_events ORDER BY id ASC")?;
            let rows = stmt.query_map([], |row| {
                let payload: String = row.get(0)?;
                serde_json::from_str(&payload).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })?;
            let mut reports = Vec::new();
            for row in rows {
                reports.push(row?);
            }
            Ok(reports)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove exactly the reports with the given SDK message ids.
pub async fn remove_by_message_ids(db: &Database, ids: &[String]) -> Result<(), GeomonError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for id in &ids {
                tx.execute(
                    "DELETE FROM unreported_events WHERE message_id = ?1",
                    params![id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
