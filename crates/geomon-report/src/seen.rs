// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seen-report gating.
//!
//! Seen acknowledgements for geofence-generated messages must not reach
//! the backend before the event report that created the message, or the
//! backend would see an ack for an id it does not know yet. Acks for
//! such messages are held back until the event batch is confirmed, then
//! released under their canonical server-assigned ids.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

use geomon_core::traits::{GeoStore, ReportTransport};
use geomon_core::types::{GeoReport, SdkEvent, SeenEntry, SeenReportBody};
use geomon_core::GeomonError;

use crate::batcher::Batcher;

#[derive(Clone)]
struct SeenAck {
    message_id: String,
    seen_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SeenReporter {
    store: Arc<dyn GeoStore>,
    transport: Arc<dyn ReportTransport>,
    batcher: Arc<Batcher>,
    events: broadcast::Sender<SdkEvent>,
    /// Acks ready to go out with the next batch.
    pending: Arc<Mutex<Vec<SeenAck>>>,
    /// Acks for geofence-generated messages whose event report has not
    /// been confirmed yet.
    deferred: Arc<Mutex<Vec<SeenAck>>>,
}

impl SeenReporter {
    pub fn new(
        store: Arc<dyn GeoStore>,
        transport: Arc<dyn ReportTransport>,
        events: broadcast::Sender<SdkEvent>,
        batch_delay: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            batcher: Arc::new(Batcher::new(batch_delay)),
            events,
            pending: Arc::new(Mutex::new(Vec::new())),
            deferred: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Records that the user has seen a message. Acks for messages that
    /// still sit in the unreported event queue are deferred; everything
    /// else is batched for immediate sending.
    pub async fn record_seen(&self, message_id: &str) -> Result<(), GeomonError> {
        let ack = SeenAck {
            message_id: message_id.to_owned(),
            seen_at: Utc::now(),
        };
        let unreported = self.store.unreported_events().await?;
        if unreported.iter().any(|r| r.message_id == ack.message_id) {
            debug!(message_id, "deferring seen ack until the event report is confirmed");
            self.deferred.lock().await.push(ack);
            return Ok(());
        }
        self.pending.lock().await.push(ack);
        self.schedule_send();
        Ok(())
    }

    /// Releases deferred acks whose event reports were just confirmed,
    /// remapping each to its canonical server id before queueing it.
    pub(crate) async fn on_reports_confirmed(
        &self,
        confirmed: &[GeoReport],
        id_mapping: &HashMap<String, String>,
    ) {
        let released = {
            let mut deferred = self.deferred.lock().await;
            let (released, held): (Vec<_>, Vec<_>) = deferred
                .drain(..)
                .partition(|ack| confirmed.iter().any(|r| r.message_id == ack.message_id));
            *deferred = held;
            released
        };
        if released.is_empty() {
            return;
        }
        let mut pending = self.pending.lock().await;
        for mut ack in released {
            if let Some(canonical) = id_mapping.get(&ack.message_id) {
                ack.message_id = canonical.clone();
            }
            pending.push(ack);
        }
    }

    /// Schedules a send for whatever is pending, if anything.
    pub(crate) async fn flush(&self) {
        if self.pending.lock().await.is_empty() {
            return;
        }
        self.schedule_send();
    }

    fn schedule_send(&self) {
        let this = self.clone();
        self.batcher.submit(async move {
            this.send_pending().await;
        });
    }

    async fn send_pending(&self) {
        if let Err(error) = self.try_send_pending().await {
            warn!(%error, "sending seen reports failed; acks retained for retry");
        }
    }

    async fn try_send_pending(&self) -> Result<(), GeomonError> {
        // Writers only append, so the snapshot stays a stable prefix of
        // the queue. Acks leave `pending` only after the transport has
        // accepted them; a send that fails or is abandoned mid-flight
        // loses nothing.
        let acks: Vec<SeenAck> = self.pending.lock().await.clone();
        if acks.is_empty() {
            return Ok(());
        }
        let now_ms = Utc::now().timestamp_millis();
        let body = SeenReportBody {
            messages: acks
                .iter()
                .map(|ack| SeenEntry {
                    message_id: ack.message_id.clone(),
                    timestamp_delta: ack.seen_at.timestamp_millis() - now_ms,
                })
                .collect(),
        };
        self.transport.send_seen_reports(&body).await?;
        self.pending.lock().await.drain(..acks.len());
        let ids = acks.into_iter().map(|ack| ack.message_id).collect();
        let _ = self.events.send(SdkEvent::SeenReportsSent(ids));
        Ok(())
    }
}
