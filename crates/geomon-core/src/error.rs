// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the geomon geofencing SDK.

use thiserror::Error;

/// The primary error type used across all geomon traits and core operations.
#[derive(Debug, Error)]
pub enum GeomonError {
    /// Configuration errors (missing capability, invalid config values,
    /// missing required host component). Fatal to the operation, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Platform region provider errors (connection failure, request rejected).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Backend transport errors (timeout, non-2xx status, malformed response).
    /// Recoverable: the unreported queue is retained and retried on the next trigger.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
