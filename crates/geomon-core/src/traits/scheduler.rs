// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-independent wake-up scheduling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GeomonError;

/// Tag identifying why a scheduled wake-up fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wakeup {
    /// Re-run the monitoring computation (an attachment becomes active).
    Refresh,
    /// Purge expired attachments and re-run the monitoring computation.
    Expire,
}

/// Schedules wake-ups at absolute instants, replacing any previously
/// scheduled wake-up with the same tag.
///
/// The monitor only depends on this trait, never on a platform alarm API.
#[async_trait]
pub trait WakeupScheduler: Send + Sync {
    async fn schedule(&self, at: DateTime<Utc>, wakeup: Wakeup) -> Result<(), GeomonError>;
}
