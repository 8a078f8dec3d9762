//! Transport faults.
//!
//! Faults are published on the transport's fault hub. They describe things
//! that went wrong while the channel ran on its own, so there is no caller
//! to return an error to.

// ============================================================================
// Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// FaultKind
// ============================================================================

/// Category of a [`TransportFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The connection failed or errored. A close follows.
    Transport,
    /// A queued frame could not be written.
    Send,
    /// Reconnection gave up after the configured number of retries.
    ReconnectExhausted {
        /// Retries made.
        attempts: u32,
    },
    /// `connect()` was called outside a tokio runtime.
    Runtime,
}

// ============================================================================
// TransportFault
// ============================================================================

/// A fault reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportFault {
    /// Fault category.
    pub kind: FaultKind,
    /// Human-readable detail.
    pub message: String,
}

impl TransportFault {
    /// Creates a connection fault.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Transport,
            message: message.into(),
        }
    }

    /// Creates a write fault.
    #[inline]
    pub fn send(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Send,
            message: message.into(),
        }
    }

    /// Creates a reconnect exhaustion fault.
    #[inline]
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self {
            kind: FaultKind::ReconnectExhausted { attempts },
            message: format!("Reconnection abandoned after {attempts} attempts"),
        }
    }

    /// Creates a missing-runtime fault.
    #[inline]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Runtime,
            message: message.into(),
        }
    }

    /// Returns `true` if the transport will not reconnect by itself.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            FaultKind::ReconnectExhausted { .. } | FaultKind::Runtime
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message() {
        let fault = TransportFault::reconnect_exhausted(5);
        assert_eq!(fault.to_string(), "Reconnection abandoned after 5 attempts");
        assert!(fault.is_terminal());
    }

    #[test]
    fn test_transport_fault_not_terminal() {
        assert!(!TransportFault::transport("refused").is_terminal());
        assert!(!TransportFault::send("broken pipe").is_terminal());
    }
}
