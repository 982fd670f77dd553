// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for geomon integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a device platform or backend.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock region provider with scripted connection state
//! - [`MockScheduler`] - Wakeup scheduler that records instead of arming timers
//! - [`MockTransport`] - Reporting transport with scripted responses
//! - [`TestHarness`] - Fully wired SDK stack over mocks and a temp database

pub mod harness;
pub mod mock_provider;
pub mod mock_scheduler;
pub mod mock_transport;

pub use harness::TestHarness;
pub use mock_provider::MockProvider;
pub use mock_scheduler::MockScheduler;
pub use mock_transport::MockTransport;
