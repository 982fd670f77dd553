// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign lifecycle set operations (finished / suspended).

use std::collections::HashSet;

use geomon_core::GeomonError;
use rusqlite::params;

use crate::database::Database;

/// Lifecycle state of a campaign as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignState {
    Finished,
    Suspended,
}

impl CampaignState {
    fn as_str(self) -> &'static str {
        match self {
            CampaignState::Finished => "finished",
            CampaignState::Suspended => "suspended",
        }
    }
}

/// All campaign ids recorded with the given state.
pub async fn ids_for_state(
    db: &Database,
    state: CampaignState,
) -> Result<HashSet<String>, GeomonError> {
    let state = state.as_str();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT campaign_id FROM campaign_state WHERE state = ?1")?;
            let rows = stmt.query_map(params![state], |row| row.get::<_, String>(0))?;
            let mut ids = HashSet::new();
            for row in rows {
                ids.insert(row?);
            }
            Ok(ids)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Merge ids into the set for the given state. Union only; existing entries
/// are never removed.
pub async fn add_ids(
    db: &Database,
    state: CampaignState,
    ids: &[String],
) -> Result<(), GeomonError> {
    let state = state.as_str();
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for id in &ids {
                tx.execute(
                    "INSERT OR IGNORE INTO campaign_state (campaign_id, state) VALUES (?1, ?2)",
                    params![id, state],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
