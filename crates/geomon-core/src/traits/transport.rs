// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend reporting transport trait.

use async_trait::async_trait;

use crate::error::GeomonError;
use crate::types::{EventReportBody, EventReportResponse, SeenReportBody};

/// Transport to the backend reporting endpoints.
///
/// Timeouts are the transport's responsibility; the pipeline itself has no
/// deadline and retries indefinitely via re-triggering.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Send one event report batch.
    async fn send_event_reports(
        &self,
        body: &EventReportBody,
    ) -> Result<EventReportResponse, GeomonError>;

    /// Send one seen acknowledgement batch.
    async fn send_seen_reports(&self, body: &SeenReportBody) -> Result<(), GeomonError>;
}
