//! Connection status values.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Lifecycle status of the channel transport.
///
/// Exactly one value holds at a time. Transitions are made by the transport
/// and published on its status hub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// A connection attempt is in flight.
    Connecting,
    /// The link is open and `send` is accepted.
    Connected,
    /// No link is open or being opened.
    #[default]
    Disconnected,
    /// The transport reported an error. A close usually follows.
    Error,
}

impl ConnectionStatus {
    /// Returns the lowercase wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }

    /// Returns `true` if sends are accepted in this status.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ConnectionStatus::Connected).unwrap();
        assert_eq!(json, "\"connected\"");

        let parsed: ConnectionStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, ConnectionStatus::Error);
    }

    #[test]
    fn test_only_connected_accepts_sends() {
        assert!(ConnectionStatus::Connected.is_connected());
        assert!(!ConnectionStatus::Connecting.is_connected());
        assert!(!ConnectionStatus::Error.is_connected());
    }
}
