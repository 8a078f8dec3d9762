//! Type-safe identifiers.
//!
//! Newtype wrappers keep hub subscriptions and transport links from being
//! confused with each other or with plain counters.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// SubscriptionId
// ============================================================================

/// Identifies one subscription within a [`Hub`](crate::hub::Hub).
///
/// Ids are unique per hub and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a subscription ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ============================================================================
// LinkId
// ============================================================================

/// Identifies one physical connection attempt made by a transport.
///
/// Every `connect()` that opens a new link gets a fresh id, which lets the
/// transport discard events from links it has already replaced or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u64);

impl LinkId {
    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

// ============================================================================
// IdSequence
// ============================================================================

/// Monotonic source of ids, starting at 1.
#[derive(Debug, Default)]
pub(crate) struct IdSequence(AtomicU64);

impl IdSequence {
    pub(crate) fn next_subscription(&self) -> SubscriptionId {
        SubscriptionId(self.bump())
    }

    pub(crate) fn next_link(&self) -> LinkId {
        LinkId(self.bump())
    }

    fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

// ============================================================================
// Tests
// ============================================================================
