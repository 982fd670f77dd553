// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions forming the boundary of the geomon core.
//!
//! The monitor and the reporting pipeline only ever see these traits; the
//! concrete SQLite store, platform provider, alarm scheduler, and HTTP
//! transport are injected at construction time.

pub mod provider;
pub mod scheduler;
pub mod store;
pub mod transport;

pub use provider::{RegionProvider, TransitionSink};
pub use scheduler::{Wakeup, WakeupScheduler};
pub use store::GeoStore;
pub use transport::ReportTransport;
