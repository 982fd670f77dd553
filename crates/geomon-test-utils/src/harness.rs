// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete SDK stack with mock adapters and a
//! temp SQLite database: store, monitor, reporting pipeline, and the
//! provider event loop. Tests drive it by injecting provider events and
//! asserting on captured transport bodies and published SDK events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use geomon_config::model::{MonitoringConfig, StorageConfig};
use geomon_core::types::{ProviderEvent, SdkEvent};
use geomon_core::GeomonError;
use geomon_monitor::{spawn_event_loop, GeofenceMonitor};
use geomon_report::GeoReporter;
use geomon_storage::SqliteStore;

use crate::mock_provider::MockProvider;
use crate::mock_scheduler::MockScheduler;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    batch_delay: Duration,
    provider_connected: bool,
    monitoring_enabled: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            batch_delay: Duration::from_millis(20),
            provider_connected: true,
            monitoring_enabled: true,
        }
    }

    /// Set the debounce window used by the reporting pipeline.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Start with a provider that has not connected yet.
    pub fn with_disconnected_provider(mut self) -> Self {
        self.provider_connected = false;
        self
    }

    /// Disable monitoring in the configuration.
    pub fn with_monitoring_disabled(mut self) -> Self {
        self.monitoring_enabled = false;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, GeomonError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| GeomonError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = SqliteStore::new(storage_config);
        store.initialize().await?;
        let store = Arc::new(store);

        let provider = Arc::new(if self.provider_connected {
            MockProvider::new()
        } else {
            MockProvider::disconnected()
        });
        let scheduler = Arc::new(MockScheduler::new());
        let transport = Arc::new(MockTransport::new());

        let monitor = Arc::new(GeofenceMonitor::new(
            store.clone(),
            provider.clone(),
            scheduler.clone(),
            &MonitoringConfig {
                enabled: self.monitoring_enabled,
            },
        ));

        let (sdk_events, sdk_events_rx) = broadcast::channel(32);
        let reporter = GeoReporter::new(
            store.clone(),
            transport.clone(),
            sdk_events.clone(),
            self.batch_delay,
        );

        let (provider_events, provider_events_rx) = mpsc::channel(32);
        let event_loop = spawn_event_loop(
            monitor.clone(),
            Arc::new(reporter.clone()),
            provider_events_rx,
        );

        Ok(TestHarness {
            _temp_dir: temp_dir,
            store,
            provider,
            scheduler,
            transport,
            monitor,
            reporter,
            provider_events,
            sdk_events,
            sdk_events_rx,
            event_loop,
        })
    }
}

/// A fully wired SDK stack over mocks and a temp database.
pub struct TestHarness {
    _temp_dir: tempfile::TempDir,
    pub store: Arc<SqliteStore>,
    pub provider: Arc<MockProvider>,
    pub scheduler: Arc<MockScheduler>,
    pub transport: Arc<MockTransport>,
    pub monitor: Arc<GeofenceMonitor>,
    pub reporter: GeoReporter,
    provider_events: mpsc::Sender<ProviderEvent>,
    sdk_events: broadcast::Sender<SdkEvent>,
    pub sdk_events_rx: broadcast::Receiver<SdkEvent>,
    event_loop: JoinHandle<()>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Inject a provider event into the monitor's event loop.
    pub async fn inject(&self, event: ProviderEvent) {
        self.provider_events
            .send(event)
            .await
            .expect("event loop stopped");
    }

    /// Subscribe a fresh receiver for published SDK events.
    pub fn subscribe(&self) -> broadcast::Receiver<SdkEvent> {
        self.sdk_events.subscribe()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}
