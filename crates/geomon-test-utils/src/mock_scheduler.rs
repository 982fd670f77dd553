// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock wakeup scheduler that records requested wakeups instead of
//! arming real timers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use geomon_core::traits::{Wakeup, WakeupScheduler};
use geomon_core::GeomonError;

#[derive(Default)]
pub struct MockScheduler {
    scheduled: Mutex<Vec<(DateTime<Utc>, Wakeup)>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every wakeup requested so far, in request order.
    pub async fn scheduled(&self) -> Vec<(DateTime<Utc>, Wakeup)> {
        self.scheduled.lock().await.clone()
    }
}

#[async_trait]
impl WakeupScheduler for MockScheduler {
    async fn schedule(&self, at: DateTime<Utc>, wakeup: Wakeup) -> Result<(), GeomonError> {
        self.scheduled.lock().await.push((at, wakeup));
        Ok(())
    }
}
