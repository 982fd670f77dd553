// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock region provider for deterministic testing.
//!
//! `MockProvider` implements `RegionProvider` with scripted availability
//! and connection state, capturing every add/remove request so tests can
//! assert exactly what the monitor asked the platform to do.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use geomon_core::traits::RegionProvider;
use geomon_core::types::Region;
use geomon_core::GeomonError;

pub struct MockProvider {
    available: AtomicBool,
    connected: AtomicBool,
    fail_add: AtomicBool,
    connect_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    added: Mutex<Vec<Vec<Region>>>,
}

impl MockProvider {
    /// Create an available, already-connected provider.
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            connected: AtomicBool::new(true),
            fail_add: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            added: Mutex::new(Vec::new()),
        }
    }

    /// Create an available provider that is not yet connected, so the
    /// first request is deferred until `set_connected(true)` plus a
    /// `ConnectionReady` event.
    pub fn disconnected() -> Self {
        let provider = Self::new();
        provider.connected.store(false, Ordering::SeqCst);
        provider
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_fail_add(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    /// Every batch of regions passed to `add_regions`, oldest first.
    pub async fn added_batches(&self) -> Vec<Vec<Region>> {
        self.added.lock().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegionProvider for MockProvider {
    fn available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<(), GeomonError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_regions(&self, regions: Vec<Region>) -> Result<(), GeomonError> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(GeomonError::Provider {
                message: "add_regions rejected".into(),
                source: None,
            });
        }
        self.added.lock().await.push(regions);
        Ok(())
    }

    async fn remove_regions(&self) -> Result<(), GeomonError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
