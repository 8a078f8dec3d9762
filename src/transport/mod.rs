//! WebSocket transport layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐                        ┌──────────────┐
//! │  Transport               │                        │  Remote      │
//! │   ReconnectState         │       WebSocket        │  server      │
//! │   LinkHandle ──► event ──┼───────────────────────►│              │
//! │               loop task  │◄───────────────────────┤              │
//! │   Hubs: messages,        │                        └──────────────┘
//! │         status, faults   │
//! └──────────────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::connect` - publish `connecting`, spawn a link task
//! 2. Link opens - attempt count reset, publish `connected`
//! 3. Frames decoded and published on the message hub
//! 4. Unintended close - publish `disconnected`, schedule a retry after
//!    `base_delay * attempt`, give up after `max_attempts`
//! 5. `Transport::disconnect` - cancel timer, send normal close
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Link event loop |
//! | `core` | [`Transport`] |
//! | `fault` | Faults published while running |
//! | `reconnect` | Backoff policy and attempt counter |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket link and event loop.
pub mod connection;

/// Channel transport.
pub mod core;

/// Transport faults.
pub mod fault;

/// Reconnection policy.
pub mod reconnect;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::CloseInfo;
pub use self::core::Transport;
pub use fault::{FaultKind, TransportFault};
pub use reconnect::{
    Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, ReconnectPolicy, ReconnectState,
};
