//! Channel context shared by every consumer.
//!
//! A [`Channel`] is constructed once at application startup and handed to
//! whatever needs the connection. Clones share one transport, so all
//! consumers see the same status and the same message stream.
//!
//! # Example
//!
//! ```no_run
//! use healing_socket::Channel;
//!
//! # async fn example() -> healing_socket::Result<()> {
//! let channel = Channel::from_env()?;
//! channel.start();
//!
//! let _notifications = channel.messages().subscribe(|msg| {
//!     if msg.kind == "notification" {
//!         println!("{}", msg.payload);
//!     }
//! });
//!
//! // ...
//!
//! channel.shutdown();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::correlation::send_and_await;
use crate::error::Result;
use crate::hub::Hub;
use crate::protocol::{ConnectionStatus, InboundMessage, OutboundMessage};
use crate::transport::{Transport, TransportFault};

use super::builder::ChannelBuilder;
use super::options::ChannelConfig;

// ============================================================================
// Channel
// ============================================================================

/// Shared handle to the one logical connection.
///
/// Dropping the last clone closes the link and cancels pending timers.
#[derive(Clone)]
pub struct Channel {
    config: Arc<ChannelConfig>,
    transport: Transport,
}

// ============================================================================
// Channel - Display
// ============================================================================

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("endpoint", &self.config.endpoint.as_str())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Channel - Construction
// ============================================================================

impl Channel {
    /// Creates a configuration builder for the channel.
    #[inline]
    #[must_use]
    pub fn builder() -> ChannelBuilder {
        ChannelBuilder::new()
    }

    /// Creates a channel from an already validated configuration.
    #[must_use]
    pub fn new(config: ChannelConfig) -> Self {
        let transport = Transport::new(&config);
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Creates a channel whose endpoint comes from `WEBSOCKET_URL`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if the variable is unset
    ///   or not a websocket URL
    pub fn from_env() -> Result<Self> {
        ChannelConfig::from_env().map(Self::new)
    }
}

// ============================================================================
// Channel - Lifecycle
// ============================================================================

impl Channel {
    /// Opens the connection. Reconnection is automatic from here on.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&self) {
        info!(endpoint = %self.config.endpoint, "Starting channel");
        self.transport.connect();
    }

    /// Closes the connection and stops reconnecting.
    ///
    /// The channel can be started again afterwards.
    pub fn shutdown(&self) {
        info!(endpoint = %self.config.endpoint, "Shutting down channel");
        self.transport.disconnect();
    }

    /// Waits until the link is open.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`](crate::Error::Connection) if `limit` elapses
    ///   or reconnection gives up
    pub async fn wait_connected(&self, limit: Duration) -> Result<()> {
        self.transport.wait_connected(limit).await
    }
}

// ============================================================================
// Channel - Messaging
// ============================================================================

impl Channel {
    /// Sends a message. Returns `false` if the channel is not connected.
    #[inline]
    pub fn send(&self, message: impl Into<OutboundMessage>) -> bool {
        self.transport.send(message)
    }

    /// Sends `request` and waits for the first reply `predicate` accepts.
    ///
    /// See [`send_and_await`](crate::correlation::send_and_await).
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`](crate::Error::NotConnected) if the send was refused
    /// - [`Error::CorrelationTimeout`](crate::Error::CorrelationTimeout) if no
    ///   reply matched in time
    pub async fn send_and_await<P>(
        &self,
        request: impl Into<OutboundMessage>,
        predicate: P,
        reply_timeout: Duration,
    ) -> Result<InboundMessage>
    where
        P: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
    {
        send_and_await(&self.transport, request, predicate, reply_timeout).await
    }
}

// ============================================================================
// Channel - Accessors
// ============================================================================

impl Channel {
    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Returns the underlying transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the inbound message hub.
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &Hub<InboundMessage> {
        self.transport.messages()
    }

    /// Returns the status change hub.
    #[inline]
    #[must_use]
    pub fn status_events(&self) -> &Hub<ConnectionStatus> {
        self.transport.status_events()
    }

    /// Returns the fault hub.
    #[inline]
    #[must_use]
    pub fn faults(&self) -> &Hub<TransportFault> {
        self.transport.faults()
    }

    /// Returns the current connection status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.transport.status()
    }

    /// Returns `true` if the link is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}

// ============================================================================
// Tests
// ============================================================================
