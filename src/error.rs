//! Error types for the healing socket.
//!
//! Only caller-facing operations return [`Result<T>`]. Conditions that occur
//! while the channel runs on its own (transport errors, reconnect exhaustion)
//! are published as faults on the transport's fault hub instead.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Url`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::NotConnected`] |
//! | Correlation | [`Error::CorrelationTimeout`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::protocol::ConnectionStatus;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by the channel builder when a setting is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint address could not be parsed.
    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The link did not open.
    ///
    /// Returned when waiting for a connection times out or reconnection
    /// gives up first.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The transport was dropped while a caller was waiting on it.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A send was attempted while the link was not open.
    #[error("Not connected (status: {status})")]
    NotConnected {
        /// Status observed when the send was refused.
        status: ConnectionStatus,
    },

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// No inbound message matched a correlated request in time.
    #[error("No matching reply within {timeout_ms}ms")]
    CorrelationTimeout {
        /// Milliseconds waited before giving up.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a not-connected error.
    #[inline]
    pub fn not_connected(status: ConnectionStatus) -> Self {
        Self::NotConnected { status }
    }

    /// Creates a correlation timeout error.
    #[inline]
    pub fn correlation_timeout(timeout_ms: u64) -> Self {
        Self::CorrelationTimeout { timeout_ms }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::CorrelationTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::NotConnected { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed when the caller issues a fresh request.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CorrelationTimeout { .. } | Self::NotConnected { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
