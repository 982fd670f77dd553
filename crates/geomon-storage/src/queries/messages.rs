// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use geomon_core::types::Message;
use geomon_core::GeomonError;
use rusqlite::params;

use crate::database::Database;

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id: String = row.get(0)?;
    let body: Option<String> = row.get(1)?;
    let geo_json: Option<String> = row.get(2)?;
    let created_at: String = row.get(3)?;

    let geo = match geo_json {
        Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(Message {
        id,
        body,
        geo,
        created_at,
    })
}

/// Upsert messages by id in a single transaction.
pub async fn save(db: &Database, messages: &[Message]) -> Result<(), GeomonError> {
    let messages = messages.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for msg in &messages {
                let geo_json = msg
                    .geo
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                tx.execute(
                    "INSERT OR REPLACE INTO messages (id, body, geo, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![msg.id, msg.body, geo_json, msg.created_at.to_rfc3339()],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all stored messages in insertion-id order.
pub async fn find_all(db: &Database) -> Result<Vec<Message>, GeomonError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, body, geo, created_at FROM messages ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map([], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete messages with the given ids.
pub async fn delete_by_ids(db: &Database, ids: &[String]) -> Result<(), GeomonError> {
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for id in &ids {
                tx.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete every stored message.
pub async fn delete_all(db: &Database) -> Result<(), GeomonError> {
    db.connection()
        .call(|conn| {
            conn.execute("DELETE FROM messages", [])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Rewrite message ids in place per the backend-assigned mapping.
///
/// Messages not present in the mapping are untouched.
pub async fn update_ids(
    db: &Database,
    mapping: &HashMap<String, String>,
) -> Result<(), GeomonError> {
    let mapping: Vec<(String, String)> = mapping
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for (sdk_id, canonical_id) in &mapping {
                tx.execute(
                    "UPDATE messages SET id = ?2 WHERE id = ?1",
                    params![sdk_id, canonical_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
