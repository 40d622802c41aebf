//! Error types for dapwire.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all dapwire operations.
#[derive(Debug, Error)]
pub enum DapwireError {
    /// I/O error on the underlying stream pair.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (malformed message, unexpected shape, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The adapter answered a request with `success: false`.
    ///
    /// Displays exactly the message text supplied by the adapter, so callers
    /// matching on error text see what the peer sent and nothing else.
    #[error("{message}")]
    Peer {
        /// Command the failed request carried.
        command: String,
        /// Error message reported by the adapter.
        message: String,
    },

    /// No event of the awaited name arrived within the timeout.
    #[error("no '{event}' event received after {}ms", .timeout.as_millis())]
    EventTimeout {
        /// Name of the awaited event.
        event: String,
        /// How long the wait lasted before giving up.
        timeout: Duration,
    },

    /// `send` was called before `connect` bound a stream pair.
    #[error("session is not connected")]
    NotConnected,

    /// `connect` was called on a session that already has a stream pair.
    #[error("session is already connected")]
    AlreadyConnected,

    /// The stream closed while requests were still in flight.
    #[error("connection closed")]
    ConnectionClosed,

    /// Backpressure timeout - the write queue stayed full.
    #[error("write queue full: adapter is not reading")]
    BackpressureTimeout,
}

/// Result type alias using DapwireError.
pub type Result<T> = std::result::Result<T, DapwireError>;
