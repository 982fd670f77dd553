// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform region provider trait and the transition sink consumed by it.

use async_trait::async_trait;

use crate::error::GeomonError;
use crate::types::{Region, RegionTransition};

/// The device-level geofencing provider.
///
/// Add/remove requests are asynchronous; when the provider connection is not
/// yet ready, `connect()` is issued and the caller's pending operation is
/// replayed once a `ProviderEvent::ConnectionReady` arrives on the monitor's
/// event channel.
#[async_trait]
pub trait RegionProvider: Send + Sync {
    /// Whether the platform geofencing capability is available at all.
    fn available(&self) -> bool;

    /// Whether the provider connection is currently ready for requests.
    fn connected(&self) -> bool;

    /// Begin establishing the provider connection. Completion is observed
    /// via `ProviderEvent::ConnectionReady`, not by awaiting this call.
    async fn connect(&self) -> Result<(), GeomonError>;

    /// Request monitoring of the given regions.
    async fn add_regions(&self, regions: Vec<Region>) -> Result<(), GeomonError>;

    /// Request removal of all monitored regions.
    async fn remove_regions(&self) -> Result<(), GeomonError>;
}

/// Consumer of geofence transitions, decoupling the monitor's event loop
/// from the reporting pipeline.
#[async_trait]
pub trait TransitionSink: Send + Sync {
    async fn handle_transition(&self, transition: RegionTransition) -> Result<(), GeomonError>;
}
