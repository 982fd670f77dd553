// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateful geofence monitor.
//!
//! Drives the platform region provider from monitoring plans, persists the
//! monitoring-active flag, schedules the refresh/expiry wake-ups, and replays
//! a pending add/remove request when the provider connection becomes ready.
//! At most one provider request is outstanding at a time, guarded by the
//! pending-request marker.

use std::sync::Arc;

use chrono::Utc;
use geomon_config::model::MonitoringConfig;
use geomon_core::types::ProviderEvent;
use geomon_core::{GeomonError, GeoStore, RegionProvider, TransitionSink, Wakeup, WakeupScheduler};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::calculator::compute_plan;

/// The provider request awaiting a ready connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRequest {
    None,
    Add,
    Remove,
}

/// Stateful controller for device-level geofence monitoring.
pub struct GeofenceMonitor {
    store: Arc<dyn GeoStore>,
    provider: Arc<dyn RegionProvider>,
    scheduler: Arc<dyn WakeupScheduler>,
    enabled: bool,
    pending: Mutex<PendingRequest>,
}

impl GeofenceMonitor {
    pub fn new(
        store: Arc<dyn GeoStore>,
        provider: Arc<dyn RegionProvider>,
        scheduler: Arc<dyn WakeupScheduler>,
        config: &MonitoringConfig,
    ) -> Self {
        Self {
            store,
            provider,
            scheduler,
            enabled: config.enabled,
            pending: Mutex::new(PendingRequest::None),
        }
    }

    /// Compute the current plan, schedule the next wake-ups, and request
    /// monitoring of the resulting regions.
    ///
    /// No-op when the platform capability is unavailable, the feature is
    /// disabled, or the previously computed set is already confirmed active.
    /// Provider failures are swallowed: the flag stays false and the next
    /// trigger retries the full computation from current storage state.
    pub async fn start_monitoring(&self) -> Result<(), GeomonError> {
        if !self.enabled {
            debug!("monitoring disabled by configuration");
            return Ok(());
        }
        if !self.provider.available() {
            warn!("platform geofencing capability unavailable");
            return Ok(());
        }
        if self.store.monitoring_active().await? {
            debug!("active geo areas already monitored");
            return Ok(());
        }

        let messages = self.store.find_all_messages().await?;
        let finished = self.store.finished_campaign_ids().await?;
        let plan = compute_plan(&messages, &finished, Utc::now());

        if let Some(at) = plan.next_refresh {
            info!(%at, "next monitoring refresh scheduled");
            self.scheduler.schedule(at, Wakeup::Refresh).await?;
        }
        if let Some(at) = plan.next_expiry {
            info!(%at, "next expiry cleanup scheduled");
            self.scheduler.schedule(at, Wakeup::Expire).await?;
        }

        if plan.regions.is_empty() {
            debug!("no regions to monitor");
            return Ok(());
        }

        *self.pending.lock().await = PendingRequest::Add;
        if !self.provider.connected() {
            self.provider.connect().await?;
            return Ok(());
        }

        let count = plan.regions.len();
        match self.provider.add_regions(plan.regions).await {
            Ok(()) => {
                self.store.set_monitoring_active(true).await?;
                info!(count, "geofence monitoring activated");
            }
            Err(e) => {
                warn!(error = %e, "geofence monitoring activation failed");
            }
        }
        *self.pending.lock().await = PendingRequest::None;
        Ok(())
    }

    /// Stop monitoring all regions.
    ///
    /// The monitoring-active flag is cleared first so a crash mid-removal
    /// cannot leave stale state believed active.
    pub async fn stop_monitoring(&self) -> Result<(), GeomonError> {
        self.store.set_monitoring_active(false).await?;

        *self.pending.lock().await = PendingRequest::Remove;
        if !self.provider.connected() {
            self.provider.connect().await?;
            return Ok(());
        }

        match self.provider.remove_regions().await {
            Ok(()) => info!("geofence monitoring deactivated"),
            Err(e) => warn!(error = %e, "geofence monitoring deactivation failed"),
        }
        *self.pending.lock().await = PendingRequest::None;
        Ok(())
    }

    /// Handler for triggers that invalidate the previously confirmed set
    /// (refresh wake-up, boot, message store change): clear the flag and
    /// recompute from scratch.
    pub async fn refresh(&self) -> Result<(), GeomonError> {
        self.store.set_monitoring_active(false).await?;
        self.start_monitoring().await
    }

    /// Handler for the expiry wake-up: purge expired attachments, then
    /// recompute the monitored set.
    pub async fn expire(&self) -> Result<(), GeomonError> {
        self.purge_expired().await?;
        self.refresh().await
    }

    /// Delete the owning messages of attachments whose expiry date has
    /// passed. Invoked by the expiry wake-up independent of the add/remove
    /// path.
    pub async fn purge_expired(&self) -> Result<(), GeomonError> {
        let now = Utc::now();
        let messages = self.store.find_all_messages().await?;

        let ids: Vec<String> = messages
            .iter()
            .filter(|message| {
                message.geo.as_ref().is_some_and(|geo| {
                    !geo.areas.is_empty()
                        && geo.areas.iter().any(|area| area.is_valid())
                        && geo.is_expired(now)
                })
            })
            .map(|message| message.id.clone())
            .collect();

        if !ids.is_empty() {
            info!(count = ids.len(), "purging expired geo messages");
            self.store.delete_messages_by_ids(&ids).await?;
        }
        Ok(())
    }

    /// Replay the pending provider request exactly once after the connection
    /// became ready.
    async fn on_connection_ready(&self) {
        let pending = {
            let mut slot = self.pending.lock().await;
            std::mem::replace(&mut *slot, PendingRequest::None)
        };
        debug!(?pending, "provider connection ready");
        let result = match pending {
            PendingRequest::Add => self.start_monitoring().await,
            PendingRequest::Remove => self.stop_monitoring().await,
            PendingRequest::None => Ok(()),
        };
        if let Err(e) = result {
            warn!(error = %e, "replaying pending provider request failed");
        }
    }
}

/// Consume provider events on a dedicated task: connection-ready replays the
/// monitor's pending request, transitions are forwarded to the reporting
/// pipeline through the [`TransitionSink`] seam.
pub fn spawn_event_loop(
    monitor: Arc<GeofenceMonitor>,
    sink: Arc<dyn TransitionSink>,
    mut events: mpsc::Receiver<ProviderEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ProviderEvent::ConnectionReady => monitor.on_connection_ready().await,
                ProviderEvent::Transition(transition) => {
                    if let Err(e) = sink.handle_transition(transition).await {
                        warn!(error = %e, "geofence transition handling failed");
                    }
                }
            }
        }
        debug!("provider event channel closed");
    })
}
