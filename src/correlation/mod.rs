//! Request/reply correlation over the broadcast message hub.
//!
//! Inbound messages carry no request id. A caller sends a request and then
//! waits for the first message its predicate accepts. The subscription is
//! one-shot: it is removed on the first match, on timeout, or when the
//! waiting future is dropped.
//!
//! # Example
//!
//! ```no_run
//! use healing_socket::correlation::{DEFAULT_REPLY_TIMEOUT, action_is, send_and_await};
//! use healing_socket::Transport;
//!
//! # async fn example(transport: &Transport) -> healing_socket::Result<()> {
//! let reply = send_and_await(
//!     transport,
//!     serde_json::json!({ "action": "Auth.Register" }),
//!     action_is("Auth.Register"),
//!     DEFAULT_REPLY_TIMEOUT,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Reusable reply predicates.
pub mod predicate;

/// `send_and_await` and its hub-level core.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use predicate::{Predicate, action_is, all_of, field_eq, kind_is, ui_directive};
pub use request::{DEFAULT_REPLY_TIMEOUT, correlate, send_and_await};
