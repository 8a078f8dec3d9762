//! Subscription handles.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::identifiers::SubscriptionId;

// ============================================================================
// Flow
// ============================================================================

/// What a listener wants after handling one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep receiving.
    Continue,
    /// Remove this subscription now.
    Stop,
}

// ============================================================================
// Detach
// ============================================================================

/// Removes a subscription from whatever hub owns it.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: SubscriptionId);
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle to one hub subscription.
///
/// Dropping the handle does NOT unsubscribe. Call [`unsubscribe`] or convert
/// it with [`guard`] to tie the subscription to a scope.
///
/// [`unsubscribe`]: Subscription::unsubscribe
/// [`guard`]: Subscription::guard
#[derive(Clone)]
#[must_use = "a subscription stays active until unsubscribe() is called"]
pub struct Subscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    hub: Weak<dyn Detach>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, active: Arc<AtomicBool>, hub: Weak<dyn Detach>) -> Self {
        Self { id, active, hub }
    }

    /// Returns the subscription ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns `true` until the subscription is removed.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Removes the subscription.
    ///
    /// Idempotent. Takes effect immediately, including for a delivery that
    /// is currently walking the subscriber list.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::AcqRel)
            && let Some(hub) = self.hub.upgrade()
        {
            hub.detach(self.id);
        }
    }

    /// Converts the handle into a guard that unsubscribes on drop.
    #[inline]
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================================================
// SubscriptionGuard
// ============================================================================

/// Unsubscribes when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    /// Returns the guarded subscription.
    #[inline]
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.0
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}
