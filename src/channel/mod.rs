//! Channel context and configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Channel`] | Shared context owning the transport |
//! | [`ChannelBuilder`] | Fluent configuration builder |
//! | [`ChannelConfig`] | Endpoint, reconnection and history settings |
//!
//! # Example
//!
//! ```no_run
//! use healing_socket::Channel;
//!
//! # async fn example() -> healing_socket::Result<()> {
//! let channel = Channel::builder()
//!     .endpoint("wss://api.example.com/ws")
//!     .build()?;
//!
//! channel.start();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for channel configuration.
pub mod builder;

/// Shared channel context.
pub mod core;

/// Channel configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ChannelBuilder;
pub use self::core::Channel;
pub use options::{ChannelConfig, ENDPOINT_ENV};
