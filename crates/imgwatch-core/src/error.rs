//! Error types for the watchdog
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for watchdog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the watchdog
///
/// Variants split along the propagation policy: `Config` and `Channel` are
/// fatal before the loop starts, `FetchStatus`/`FetchTransport`/`Store` abort
/// only the current poll cycle, and `Delivery` is never escalated.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Notification channel verification errors
    #[error("notification channel error: {0}")]
    Channel(String),

    /// Fetch returned a non-success HTTP status
    #[error("fetch failed with HTTP status {status}")]
    FetchStatus {
        /// The HTTP status code returned by the server
        status: u16,
    },

    /// Fetch failed at the transport layer (DNS, TLS, timeout, ...)
    #[error("fetch transport error: {0}")]
    FetchTransport(String),

    /// Snapshot store errors (I/O or deserialization; absence is not an error)
    #[error("snapshot store error: {0}")]
    Store(String),

    /// Notification delivery errors
    #[error("notification delivery error: {0}")]
    Delivery(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a channel verification error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a fetch status error
    pub fn fetch_status(status: u16) -> Self {
        Self::FetchStatus { status }
    }

    /// Create a fetch transport error
    pub fn fetch_transport(msg: impl Into<String>) -> Self {
        Self::FetchTransport(msg.into())
    }

    /// Create a snapshot store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }
}
