// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event reporting for the geomon geofencing SDK.
//!
//! Turns geofence transitions into durable queued reports, batches them to
//! the backend with debouncing and retry, reconciles SDK-generated message
//! ids with their canonical server ids, and gates seen acknowledgements
//! behind event report confirmation.

pub mod batcher;
pub mod client;
pub mod pipeline;
pub mod seen;

pub use batcher::Batcher;
pub use client::HttpReportTransport;
pub use pipeline::GeoReporter;
pub use seen::SeenReporter;
