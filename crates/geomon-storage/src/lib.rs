// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the geomon geofencing SDK.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed operations for messages,
//! the unreported event queue, campaign lifecycle sets, and durable flags.
//!
//! The single-writer pattern is enforced by design: `Database` wraps a single
//! `tokio_rusqlite::Connection`, all query functions accept `&Database`, and
//! tokio-rusqlite serializes every closure on one background thread. This
//! eliminates SQLITE_BUSY errors under concurrent access and makes queue and
//! campaign-set mutations atomic with respect to each other.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod store;

pub use database::Database;
pub use store::SqliteStore;
