//! Channel configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use healing_socket::{ChannelConfig, ReconnectPolicy};
//!
//! # fn example() -> healing_socket::Result<()> {
//! let config = ChannelConfig::new("wss://api.example.com/ws".parse()?)
//!     .with_reconnect(ReconnectPolicy::new(3, Duration::from_millis(500)))
//!     .with_history_capacity(32);
//!
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};
use crate::hub::DEFAULT_HISTORY_CAPACITY;
use crate::transport::ReconnectPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable holding the endpoint URL.
pub const ENDPOINT_ENV: &str = "WEBSOCKET_URL";

/// URL schemes accepted for the endpoint.
pub const ALLOWED_SCHEMES: [&str; 2] = ["ws", "wss"];

// ============================================================================
// ChannelConfig
// ============================================================================

/// Everything a [`Transport`](crate::Transport) needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Server endpoint, `ws://` or `wss://`.
    pub endpoint: Url,

    /// Reconnection tuning.
    pub reconnect: ReconnectPolicy,

    /// Items each hub keeps for late subscribers. Zero disables history.
    pub history_capacity: usize,
}

// ============================================================================
// Constructors
// ============================================================================

impl ChannelConfig {
    /// Creates a configuration with default reconnection and history.
    #[inline]
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            reconnect: ReconnectPolicy::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Reads the endpoint from `WEBSOCKET_URL`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the variable is unset or the URL is invalid
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl FnOnce(&str) -> Option<String>) -> Result<Self> {
        let raw = lookup(ENDPOINT_ENV).ok_or_else(|| {
            Error::config(format!(
                "{ENDPOINT_ENV} is not set.\n\
                 Example: {ENDPOINT_ENV}=wss://api.example.com/ws"
            ))
        })?;

        let config = Self::new(parse_endpoint(&raw)?);
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ChannelConfig {
    /// Sets the reconnection policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets how many items each hub retains.
    #[inline]
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ChannelConfig {
    /// Checks the endpoint scheme and host.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the scheme is not `ws`/`wss` or the host is missing
    pub fn validate(&self) -> Result<()> {
        let scheme = self.endpoint.scheme();
        if !ALLOWED_SCHEMES.contains(&scheme) {
            return Err(Error::config(format!(
                "Unsupported endpoint scheme '{scheme}' in {}. Use ws:// or wss://",
                self.endpoint
            )));
        }

        if self.endpoint.host_str().is_none_or(str::is_empty) {
            return Err(Error::config(format!(
                "Endpoint has no host: {}",
                self.endpoint
            )));
        }

        Ok(())
    }
}

/// Parses an endpoint string, mapping parse failures to [`Error::Config`].
pub(crate) fn parse_endpoint(raw: &str) -> Result<Url> {
    Url::parse(raw.trim())
        .map_err(|e| Error::config(format!("Invalid endpoint URL '{raw}': {e}")))
}

// ============================================================================
// Tests
// ============================================================================
