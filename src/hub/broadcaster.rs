//! Fan-out broadcaster.
//!
//! # Delivery
//!
//! `publish` hands the item to every active subscriber, in subscription
//! order, on the caller's task. Nothing is queued. Deliveries are serialized
//! by a re-entrant lock: concurrent publishers take turns, while a listener
//! that publishes again from inside a delivery is allowed through.
//!
//! The subscriber list is snapshotted per delivery, so listeners may
//! subscribe or unsubscribe from inside a callback. A subscriber added during
//! a delivery does not see that item; one removed during it sees nothing more.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::trace;

use crate::identifiers::{IdSequence, SubscriptionId};

use super::subscription::{Detach, Flow, Subscription};

// ============================================================================
// Constants
// ============================================================================

/// Default number of recent items kept for late joiners.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

// ============================================================================
// Types
// ============================================================================

/// Listener callback type.
type Listener<T> = Arc<dyn Fn(&T) -> Flow + Send + Sync>;

/// One registered subscriber.
struct Entry<T> {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    listener: Listener<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Arc::clone(&self.active),
            listener: Arc::clone(&self.listener),
        }
    }
}

/// Items retained for late joiners.
struct Retained<T> {
    last: Option<T>,
    count: u64,
    history: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> Retained<T> {
    fn record(&mut self, item: &T) {
        self.count += 1;
        self.last = Some(item.clone());

        if self.capacity == 0 {
            return;
        }
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(item.clone());
    }

    fn clear(&mut self) {
        self.last = None;
        self.count = 0;
        self.history.clear();
    }
}

// ============================================================================
// Hub
// ============================================================================

/// Broadcasts every published item to all current subscribers.
///
/// Cloning a hub yields another handle to the same subscriber list.
///
/// # Example
///
/// ```
/// use healing_socket::hub::Hub;
///
/// let hub: Hub<u32> = Hub::new();
/// let sub = hub.subscribe(|n| println!("got {n}"));
///
/// hub.publish(1);
/// sub.unsubscribe();
/// hub.publish(2); // nobody listening, still counted
///
/// assert_eq!(hub.count(), 2);
/// assert_eq!(hub.last(), Some(2));
/// ```
pub struct Hub<T> {
    inner: Arc<HubInner<T>>,
}

pub(crate) struct HubInner<T> {
    subscribers: RwLock<Vec<Entry<T>>>,
    retained: Mutex<Retained<T>>,
    delivery: ReentrantMutex<()>,
    ids: IdSequence,
}

impl<T> Clone for Hub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Hub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("subscribers", &self.inner.subscribers.read().len())
            .field("count", &self.inner.retained.lock().count)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Default for Hub<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Hub - Constructor
// ============================================================================

impl<T: Clone + Send + 'static> Hub<T> {
    /// Creates a hub keeping [`DEFAULT_HISTORY_CAPACITY`] recent items.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a hub keeping up to `capacity` recent items (0 keeps none).
    #[must_use]
    pub fn with_history(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: RwLock::new(Vec::new()),
                retained: Mutex::new(Retained {
                    last: None,
                    count: 0,
                    history: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
                    capacity,
                }),
                delivery: ReentrantMutex::new(()),
                ids: IdSequence::default(),
            }),
        }
    }
}

// ============================================================================
// Hub - Subscribe / Publish
// ============================================================================

impl<T: Clone + Send + 'static> Hub<T> {
    /// Registers a listener for every future item.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_with(move |item| {
            listener(item);
            Flow::Continue
        })
    }

    /// Registers a listener that decides after each item whether to stay.
    ///
    /// Returning [`Flow::Stop`] removes the subscription before the next
    /// subscriber in line is notified.
    pub fn subscribe_with<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) -> Flow + Send + Sync + 'static,
    {
        let id = self.inner.ids.next_subscription();
        let active = Arc::new(AtomicBool::new(true));

        self.inner.subscribers.write().push(Entry {
            id,
            active: Arc::clone(&active),
            listener: Arc::new(listener),
        });

        trace!(%id, "Subscribed");

        let hub: Weak<dyn Detach> = Arc::downgrade(&self.inner) as Weak<dyn Detach>;
        Subscription::new(id, active, hub)
    }

    /// Delivers an item to every active subscriber.
    ///
    /// Returns the number of listeners invoked.
    pub fn publish(&self, item: T) -> usize {
        let _turn = self.inner.delivery.lock();

        self.inner.retained.lock().record(&item);

        let snapshot: Vec<Entry<T>> = self.inner.subscribers.read().clone();
        let mut delivered = 0;

        for entry in snapshot {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }

            delivered += 1;
            if (entry.listener)(&item) == Flow::Stop && entry.active.swap(false, Ordering::AcqRel)
            {
                self.inner.detach(entry.id);
            }
        }

        delivered
    }
}

// ============================================================================
// Hub - Accessors
// ============================================================================

impl<T: Clone + Send + 'static> Hub<T> {
    /// Returns the most recently published item.
    #[must_use]
    pub fn last(&self) -> Option<T> {
        self.inner.retained.lock().last.clone()
    }

    /// Returns how many items were published since creation or [`clear`](Self::clear).
    #[must_use]
    pub fn count(&self) -> u64 {
        self.inner.retained.lock().count
    }

    /// Returns the retained recent items, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<T> {
        self.inner.retained.lock().history.iter().cloned().collect()
    }

    /// Forgets retained items and resets the count.
    ///
    /// Subscribers are left in place.
    pub fn clear(&self) {
        self.inner.retained.lock().clear();
    }

    /// Returns the number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

// ============================================================================
// HubInner - Detach
// ============================================================================

impl<T: Send> Detach for HubInner<T> {
    fn detach(&self, id: SubscriptionId) {
        self.subscribers.write().retain(|entry| entry.id != id);
        trace!(%id, "Unsubscribed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync + 'static)
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |item: &T| sink.lock().push(item.clone()))
    }

    #[test]
    fn test_every_subscriber_sees_every_item_in_order() {
        let hub: Hub<u32> = Hub::new();
        let (first, a) = recorder();
        let (second, b) = recorder();
        let _a = hub.subscribe(a);
        let _b = hub.subscribe(b);

        for n in 0..5 {
            assert_eq!(hub.publish(n), 2);
        }

        assert_eq!(*first.lock(), vec![0, 1, 2, 3, 4]);
        assert_eq!(*second.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_subscribers_notified_in_subscription_order() {
        let hub: Hub<u32> = Hub::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                hub.subscribe(move |_| order.lock().push(i))
            })
            .collect();

        hub.publish(0);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert_eq!(subs.len(), 3);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let hub: Hub<u32> = Hub::new();
        let (seen, listener) = recorder();
        let sub = hub.subscribe(listener);

        hub.publish(1);
        sub.unsubscribe();
        sub.unsubscribe();
        hub.publish(2);

        assert!(!sub.is_active());
        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_only_removes_own_entry() {
        let hub: Hub<u32> = Hub::new();
        let (kept, a) = recorder();
        let (_, b) = recorder::<u32>();
        let _keep = hub.subscribe(a);
        let gone = hub.subscribe(b);

        gone.unsubscribe();
        hub.publish(9);

        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(*kept.lock(), vec![9]);
    }

    #[test]
    fn test_flow_stop_removes_within_delivery() {
        let hub: Hub<u32> = Hub::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let sub = hub.subscribe_with(move |n| {
            counter.fetch_add(1, Ordering::SeqCst);
            if *n == 2 { Flow::Stop } else { Flow::Continue }
        });

        for n in 1..=4 {
            hub.publish(n);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!sub.is_active());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_delivery_skips_later_listener() {
        let hub: Hub<u32> = Hub::new();
        let late_hits = Arc::new(AtomicUsize::new(0));

        let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&victim_slot);
        let _killer = hub.subscribe(move |_| {
            if let Some(victim) = slot.lock().as_ref() {
                victim.unsubscribe();
            }
        });

        let hits = Arc::clone(&late_hits);
        let victim = hub.subscribe(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        *victim_slot.lock() = Some(victim);

        hub.publish(1);
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscribe_during_delivery_sees_only_later_items() {
        let hub: Hub<u32> = Hub::new();
        let (seen, listener) = recorder();
        let listener = Arc::new(listener);
        let pending = Arc::new(Mutex::new(Vec::new()));

        let inner_hub = hub.clone();
        let holder = Arc::clone(&pending);
        let _outer = hub.subscribe_with(move |_| {
            let listener = Arc::clone(&listener);
            holder.lock().push(inner_hub.subscribe(move |n| (*listener)(n)));
            Flow::Stop
        });

        hub.publish(1);
        hub.publish(2);

        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn test_reentrant_publish_does_not_deadlock() {
        let hub: Hub<u32> = Hub::new();
        let echo = hub.clone();
        let _sub = hub.subscribe(move |n| {
            if *n == 0 {
                echo.publish(1);
            }
        });

        hub.publish(0);
        assert_eq!(hub.count(), 2);
    }

    #[test]
    fn test_retains_last_count_and_history() {
        let hub: Hub<u32> = Hub::with_history(2);
        assert_eq!(hub.last(), None);

        hub.publish(1);
        hub.publish(2);
        hub.publish(3);

        assert_eq!(hub.last(), Some(3));
        assert_eq!(hub.count(), 3);
        assert_eq!(hub.history(), vec![2, 3]);

        hub.clear();
        assert_eq!(hub.last(), None);
        assert_eq!(hub.count(), 0);
        assert!(hub.history().is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_no_history() {
        let hub: Hub<u32> = Hub::with_history(0);
        hub.publish(1);
        assert!(hub.history().is_empty());
        assert_eq!(hub.last(), Some(1));
    }

    #[test]
    fn test_guard_unsubscribes_on_drop() {
        let hub: Hub<u32> = Hub::new();
        {
            let _guard = hub.subscribe(|_| {}).guard();
            assert_eq!(hub.subscriber_count(), 1);
        }
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_unsubscribe_after_hub_dropped() {
        let hub: Hub<u32> = Hub::new();
        let sub = hub.subscribe(|_| {});
        drop(hub);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
