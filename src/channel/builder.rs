//! Builder pattern for channel configuration.
//!
//! Provides a fluent API for configuring and creating [`Channel`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use healing_socket::Channel;
//!
//! # fn example() -> healing_socket::Result<()> {
//! let channel = Channel::builder()
//!     .endpoint("wss://api.example.com/ws")
//!     .max_reconnect_attempts(10)
//!     .reconnect_base_delay(Duration::from_secs(1))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::ReconnectPolicy;

use super::core::Channel;
use super::options::{ChannelConfig, parse_endpoint};

// ============================================================================
// ChannelBuilder
// ============================================================================

/// Builder for configuring a [`Channel`] instance.
///
/// Use [`Channel::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ChannelBuilder {
    /// Raw endpoint URL, parsed on build.
    endpoint: Option<String>,
    /// Override for the retry limit.
    max_reconnect_attempts: Option<u32>,
    /// Override for the backoff unit.
    reconnect_base_delay: Option<Duration>,
    /// Override for hub history.
    history_capacity: Option<usize>,
}

// ============================================================================
// ChannelBuilder Implementation
// ============================================================================

impl ChannelBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server endpoint.
    ///
    /// # Arguments
    ///
    /// * `url` - `ws://` or `wss://` URL (e.g., "wss://api.example.com/ws")
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets how many consecutive retries are made before giving up.
    #[inline]
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = Some(attempts);
        self
    }

    /// Sets the backoff unit. Retry `n` waits `n * delay`.
    #[inline]
    #[must_use]
    pub fn reconnect_base_delay(mut self, delay: Duration) -> Self {
        self.reconnect_base_delay = Some(delay);
        self
    }

    /// Sets how many items each hub keeps for late subscribers.
    #[inline]
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = Some(capacity);
        self
    }

    /// Validates and returns the configuration without creating a channel.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the endpoint is missing, unparseable, or not
    ///   a websocket URL
    pub fn build_config(&self) -> Result<ChannelConfig> {
        let endpoint = self.validate_endpoint()?;

        let defaults = ReconnectPolicy::default();
        let policy = ReconnectPolicy::new(
            self.max_reconnect_attempts.unwrap_or(defaults.max_attempts),
            self.reconnect_base_delay.unwrap_or(defaults.base_delay),
        );

        let mut config = ChannelConfig::new(endpoint).with_reconnect(policy);
        if let Some(capacity) = self.history_capacity {
            config = config.with_history_capacity(capacity);
        }

        config.validate()?;
        Ok(config)
    }

    /// Builds the channel with validation. The channel is not started.
    ///
    /// # Errors
    ///
    /// Same as [`build_config`](Self::build_config).
    pub fn build(self) -> Result<Channel> {
        let config = self.build_config()?;
        Ok(Channel::new(config))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ChannelBuilder {
    /// Validates the endpoint configuration.
    fn validate_endpoint(&self) -> Result<url::Url> {
        let raw = self.endpoint.as_deref().ok_or_else(|| {
            Error::config(
                "Endpoint is required. Use .endpoint() to set it.\n\
                 Example: Channel::builder().endpoint(\"wss://api.example.com/ws\")",
            )
        })?;

        parse_endpoint(raw)
    }
}

// ============================================================================
// Tests
// ============================================================================
