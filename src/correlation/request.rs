//! Send one request, await one matching reply.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hub::{Flow, Hub};
use crate::protocol::{InboundMessage, OutboundMessage};
use crate::transport::Transport;
use crate::transport::reconnect::saturating_millis;

// ============================================================================
// Constants
// ============================================================================

/// Suggested reply timeout for interactive requests.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// send_and_await
// ============================================================================

/// Sends `request` and waits for the first inbound message accepted by
/// `predicate`.
///
/// Resolves exactly once:
///
/// - `Ok(message)` for the first match
/// - [`Error::NotConnected`] right away if the transport refused the send
/// - [`Error::CorrelationTimeout`] if nothing matched within `reply_timeout`
///
/// The subscription is gone by the time this returns, whatever the outcome,
/// and also if the future is dropped early. Messages that do not match are
/// left for other subscribers.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use healing_socket::correlation::send_and_await;
/// use healing_socket::protocol::session::{SessionGrant, hydrate_session};
/// use healing_socket::Transport;
///
/// # async fn example(transport: &Transport) -> healing_socket::Result<()> {
/// let reply = send_and_await(
///     transport,
///     serde_json::json!({ "action": "Auth.LoginManager" }),
///     hydrate_session(),
///     Duration::from_secs(10),
/// )
/// .await?;
///
/// let grant = SessionGrant::from_message(&reply);
/// # Ok(())
/// # }
/// ```
pub async fn send_and_await<P>(
    transport: &Transport,
    request: impl Into<OutboundMessage>,
    predicate: P,
    reply_timeout: Duration,
) -> Result<InboundMessage>
where
    P: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
{
    let request = request.into();

    correlate(transport.messages(), predicate, reply_timeout, move || {
        if transport.send(request) {
            Ok(())
        } else {
            Err(Error::not_connected(transport.status()))
        }
    })
    .await
}

/// Waits on `hub` for the first item accepted by `predicate`, after running
/// `send`.
///
/// This is the transport-independent core of [`send_and_await`]. The
/// subscription is registered before `send` runs so a fast reply cannot be
/// missed; if `send` fails it is removed again and the error returned.
pub async fn correlate<P, S>(
    hub: &Hub<InboundMessage>,
    predicate: P,
    reply_timeout: Duration,
    send: S,
) -> Result<InboundMessage>
where
    P: Fn(&InboundMessage) -> bool + Send + Sync + 'static,
    S: FnOnce() -> Result<()>,
{
    let (reply_tx, reply_rx) = oneshot::channel();
    let reply_tx = Arc::new(Mutex::new(Some(reply_tx)));

    let subscription = hub
        .subscribe_with(move |message| {
            if !predicate(message) {
                return Flow::Continue;
            }
            if let Some(tx) = reply_tx.lock().take() {
                let _ = tx.send(message.clone());
            }
            Flow::Stop
        })
        .guard();

    send()?;

    let outcome = timeout(reply_timeout, reply_rx).await;
    drop(subscription);

    match outcome {
        Ok(Ok(message)) => {
            debug!(kind = %message.kind, "Correlated reply received");
            Ok(message)
        }
        Ok(Err(_)) => Err(Error::ConnectionClosed),
        Err(_) => {
            let timeout_ms = saturating_millis(reply_timeout);
            debug!(timeout_ms, "Correlated request timed out");
            Err(Error::correlation_timeout(timeout_ms))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio_test::{assert_pending, assert_ready, task};

    use crate::correlation::predicate::{action_is, ui_directive};
    use crate::protocol::session::{SessionGrant, hydrate_session};

    const HYDRATE: &str = r#"{"ui":{"action":"HYDRATE","target":"session_store"},"data":{"userId":"u1","accessToken":"tok"}}"#;

    #[tokio::test]
    async fn test_failed_send_leaves_no_subscription() {
        let hub: Hub<InboundMessage> = Hub::new();

        let result = correlate(&hub, |_| true, Duration::from_secs(1), || {
            Err(Error::not_connected(crate::ConnectionStatus::Disconnected))
        })
        .await;

        assert!(matches!(result, Err(Error::NotConnected { .. })));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_resolves_with_first_match_and_unsubscribes() {
        let hub: Hub<InboundMessage> = Hub::new();
        let mut waiting = task::spawn(correlate(
            &hub,
            hydrate_session(),
            Duration::from_secs(5),
            || Ok(()),
        ));

        assert_pending!(waiting.poll());
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish(InboundMessage::decode(r#"{"ui":{"action":"TOAST"}}"#));
        assert_pending!(waiting.poll());

        hub.publish(InboundMessage::decode(HYDRATE));
        assert_eq!(hub.subscriber_count(), 0);

        let reply = assert_ready!(waiting.poll()).unwrap();
        let grant = SessionGrant::from_message(&reply).unwrap();
        assert_eq!(grant.user_id, "u1");
        assert_eq!(grant.access_token, "tok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_resolves_failure_and_stops_delivery() {
        let hub: Hub<InboundMessage> = Hub::new();
        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluations);

        let result = correlate(
            &hub,
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            },
            Duration::from_millis(500),
            || Ok(()),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::CorrelationTimeout { timeout_ms: 500 })
        ));
        assert_eq!(hub.subscriber_count(), 0);

        hub.publish(InboundMessage::decode(HYDRATE));
        assert_eq!(evaluations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_reply() {
        let hub: Hub<InboundMessage> = Hub::new();
        let mut first = task::spawn(correlate(
            &hub,
            hydrate_session(),
            Duration::from_secs(5),
            || Ok(()),
        ));
        let mut second = task::spawn(correlate(
            &hub,
            ui_directive("HYDRATE", "session_store"),
            Duration::from_secs(5),
            || Ok(()),
        ));

        assert_pending!(first.poll());
        assert_pending!(second.poll());

        assert_eq!(hub.publish(InboundMessage::decode(HYDRATE)), 2);

        let a = assert_ready!(first.poll()).unwrap();
        let b = assert_ready!(second.poll()).unwrap();
        assert_eq!(a.payload, b.payload);
    }

    #[tokio::test]
    async fn test_unmatched_message_reaches_other_subscribers() {
        let hub: Hub<InboundMessage> = Hub::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let _observer = hub.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut waiting = task::spawn(correlate(
            &hub,
            action_is("Auth.LoginManager"),
            Duration::from_secs(5),
            || Ok(()),
        ));
        assert_pending!(waiting.poll());

        hub.publish(InboundMessage::decode(r#"{"action":"Other"}"#));
        assert_pending!(waiting.poll());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_future_unsubscribes() {
        let hub: Hub<InboundMessage> = Hub::new();
        let mut waiting = task::spawn(correlate(
            &hub,
            |_| true,
            Duration::from_secs(5),
            || Ok(()),
        ));
        assert_pending!(waiting.poll());
        assert_eq!(hub.subscriber_count(), 1);

        drop(waiting);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
