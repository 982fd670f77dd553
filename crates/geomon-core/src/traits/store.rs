// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store trait for messages, the unreported event queue,
//! campaign lifecycle sets, and the monitoring flag.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::GeomonError;
use crate::types::{GeoReport, Message};

/// Durable storage consumed by the monitor and the reporting pipeline.
///
/// The unreported queue and the campaign lifecycle sets must survive process
/// restarts; implementations must serialize mutations so that queue and set
/// updates are atomic with respect to each other.
#[async_trait]
pub trait GeoStore: Send + Sync {
    // --- Message store ---

    /// Upsert messages by id.
    async fn save_messages(&self, messages: &[Message]) -> Result<(), GeomonError>;

    async fn find_all_messages(&self) -> Result<Vec<Message>, GeomonError>;

    async fn delete_messages_by_ids(&self, ids: &[String]) -> Result<(), GeomonError>;

    async fn delete_all_messages(&self) -> Result<(), GeomonError>;

    /// Rewrite message identifiers in place per the backend-assigned mapping
    /// (SDK id -> canonical id). Messages not present in the mapping are
    /// left untouched.
    async fn update_message_ids(
        &self,
        mapping: &HashMap<String, String>,
    ) -> Result<(), GeomonError>;

    // --- Unreported event queue ---

    /// Append reports to the durable unreported queue. Safe to call from
    /// multiple producers concurrently.
    async fn add_unreported_events(&self, reports: &[GeoReport]) -> Result<(), GeomonError>;

    /// Snapshot the entire current unreported queue without removing anything.
    async fn unreported_events(&self) -> Result<Vec<GeoReport>, GeomonError>;

    /// Remove exactly the reports with the given SDK message ids.
    async fn remove_unreported_events(&self, message_ids: &[String]) -> Result<(), GeomonError>;

    // --- Campaign lifecycle sets ---

    async fn finished_campaign_ids(&self) -> Result<HashSet<String>, GeomonError>;

    async fn suspended_campaign_ids(&self) -> Result<HashSet<String>, GeomonError>;

    /// Merge ids into the finished set (union, never shrunk).
    async fn add_finished_campaign_ids(&self, ids: &[String]) -> Result<(), GeomonError>;

    /// Merge ids into the suspended set (union, never shrunk).
    async fn add_suspended_campaign_ids(&self, ids: &[String]) -> Result<(), GeomonError>;

    // --- Monitoring flag ---

    /// Whether all currently active geo areas are believed monitored.
    async fn monitoring_active(&self) -> Result<bool, GeomonError>;

    async fn set_monitoring_active(&self, active: bool) -> Result<(), GeomonError>;
}
