// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reporting transport with scripted responses.
//!
//! `MockTransport` implements `ReportTransport` against an in-memory FIFO
//! of scripted outcomes and captures every body it is handed, so tests can
//! assert the exact wire payloads a reporting round produced.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use geomon_core::traits::ReportTransport;
use geomon_core::types::{EventReportBody, EventReportResponse, SeenReportBody};
use geomon_core::GeomonError;

enum Scripted {
    Respond(EventReportResponse),
    Fail,
}

pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    event_bodies: Mutex<Vec<EventReportBody>>,
    seen_bodies: Mutex<Vec<SeenReportBody>>,
    fail_seen: Mutex<bool>,
}

impl MockTransport {
    /// Create a transport that answers every event batch with the empty
    /// (all-defaults) response.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            event_bodies: Mutex::new(Vec::new()),
            seen_bodies: Mutex::new(Vec::new()),
            fail_seen: Mutex::new(false),
        }
    }

    /// Queue a response for the next event report batch.
    pub async fn push_response(&self, response: EventReportResponse) {
        self.script.lock().await.push_back(Scripted::Respond(response));
    }

    /// Queue a failure for the next event report batch.
    pub async fn push_failure(&self) {
        self.script.lock().await.push_back(Scripted::Fail);
    }

    pub async fn set_fail_seen(&self, fail: bool) {
        *self.fail_seen.lock().await = fail;
    }

    /// Every event report body sent so far, oldest first.
    pub async fn event_bodies(&self) -> Vec<EventReportBody> {
        self.event_bodies.lock().await.clone()
    }

    /// Every seen report body sent so far, oldest first.
    pub async fn seen_bodies(&self) -> Vec<SeenReportBody> {
        self.seen_bodies.lock().await.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportTransport for MockTransport {
    async fn send_event_reports(
        &self,
        body: &EventReportBody,
    ) -> Result<EventReportResponse, GeomonError> {
        let scripted = self.script.lock().await.pop_front();
        match scripted {
            Some(Scripted::Fail) => Err(GeomonError::Transport {
                message: "scripted failure".into(),
                source: None,
            }),
            Some(Scripted::Respond(response)) => {
                self.event_bodies.lock().await.push(body.clone());
                Ok(response)
            }
            None => {
                self.event_bodies.lock().await.push(body.clone());
                Ok(EventReportResponse::default())
            }
        }
    }

    async fn send_seen_reports(&self, body: &SeenReportBody) -> Result<(), GeomonError> {
        if *self.fail_seen.lock().await {
            return Err(GeomonError::Transport {
                message: "scripted seen failure".into(),
                source: None,
            });
        }
        self.seen_bodies.lock().await.push(body.clone());
        Ok(())
    }
}
