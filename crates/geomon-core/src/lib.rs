// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the geomon geofencing SDK.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain model used throughout the geomon workspace. The monitor, storage,
//! and reporting crates all implement or consume traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GeomonError;
pub use traits::{
    GeoStore, RegionProvider, ReportTransport, TransitionSink, Wakeup, WakeupScheduler,
};
pub use types::{
    Area, Geo, GeoEventType, GeoLatLng, GeoReport, Message, MonitoringPlan, ProviderEvent,
    Region, RegionTransition, SdkEvent,
};
