//! Event fan-out.
//!
//! A [`Hub`] receives each item exactly once from its producer and hands it
//! to every current subscriber, synchronously and in arrival order. The
//! transport owns three of them: inbound messages, status transitions and
//! faults.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `broadcaster` | [`Hub`] and its delivery loop |
//! | `subscription` | [`Subscription`] handles, [`SubscriptionGuard`], [`Flow`] |

// ============================================================================
// Submodules
// ============================================================================

/// Fan-out broadcaster.
pub mod broadcaster;

/// Subscription handles.
pub mod subscription;

// ============================================================================
// Re-exports
// ============================================================================

pub use broadcaster::{DEFAULT_HISTORY_CAPACITY, Hub};
pub use subscription::{Flow, Subscription, SubscriptionGuard};
