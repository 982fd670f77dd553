// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Geofence monitoring for the geomon SDK.
//!
//! Splits the concern in two: a pure, deterministic monitoring-set
//! [`calculator`] and the stateful [`controller`] that drives the platform
//! region provider, persists the monitoring flag, and reschedules itself via
//! provider-independent wake-ups.

pub mod calculator;
pub mod controller;

pub use calculator::compute_plan;
pub use controller::{spawn_event_loop, GeofenceMonitor};
