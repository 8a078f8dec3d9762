//! Healing Socket - a self-reconnecting websocket channel with
//! request/reply correlation.
//!
//! This library keeps one persistent duplex connection to a server, heals it
//! after unintended closes, and fans every event out to any number of
//! consumers.
//!
//! # Architecture
//!
//! The channel is built in layers:
//!
//! - **Transport**: one physical connection, a uniform status signal,
//!   `send` and a linear-backoff reconnection controller
//! - **Hubs**: multi-subscriber fan-out for messages, status and faults
//! - **Correlation**: send a request, then wait for the first inbound
//!   message a predicate accepts, or time out
//!
//! Key design principles:
//!
//! - Inbound messages carry no request id; replies are matched by shape
//! - Only unintended closes reconnect; [`Channel::shutdown`] is final
//! - Runtime failures are published as values, never panics
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use healing_socket::protocol::session::{SessionGrant, hydrate_session};
//! use healing_socket::{Channel, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let channel = Channel::builder()
//!         .endpoint("wss://api.example.com/ws")
//!         .build()?;
//!
//!     let _status = channel
//!         .status_events()
//!         .subscribe(|status| println!("status: {status}"));
//!     channel.start();
//!
//!     let reply = channel
//!         .send_and_await(
//!             serde_json::json!({ "action": "Auth.LoginManager" }),
//!             hydrate_session(),
//!             Duration::from_secs(10),
//!         )
//!         .await?;
//!
//!     if let Some(grant) = SessionGrant::from_message(&reply) {
//!         println!("logged in as {}", grant.user_id);
//!     }
//!
//!     channel.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`channel`] | [`Channel`] context, builder and configuration |
//! | [`correlation`] | Request/reply matching with timeout |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`hub`] | Multi-subscriber fan-out |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Message and status types |
//! | [`transport`] | Connection, reconnection and faults |

// ============================================================================
// Modules
// ============================================================================

/// Channel context and configuration.
///
/// Use [`Channel::builder()`] to create a configured channel.
pub mod channel;

/// Request/reply correlation.
pub mod correlation;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Event fan-out hubs.
pub mod hub;

/// Type-safe identifiers.
pub mod identifiers;

/// Message, status and session payload types.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Channel types
pub use channel::{Channel, ChannelBuilder, ChannelConfig};

// Correlation
pub use correlation::{DEFAULT_REPLY_TIMEOUT, send_and_await};

// Error types
pub use error::{Error, Result};

// Hub types
pub use hub::{Flow, Hub, Subscription, SubscriptionGuard};

// Identifier types
pub use identifiers::SubscriptionId;

// Protocol types
pub use protocol::{ConnectionStatus, InboundMessage, OutboundMessage, SessionGrant};

// Transport types
pub use transport::{FaultKind, ReconnectPolicy, Transport, TransportFault};
