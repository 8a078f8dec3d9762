//! Channel transport.
//!
//! [`Transport`] owns at most one live link to the configured endpoint,
//! turns link events into status transitions and decoded messages, and runs
//! the reconnection controller.
//!
//! # Status Transitions
//!
//! ```text
//! connect() ──► connecting ──open──► connected
//!                   │                    │
//!                 error                close (unintended)
//!                   ▼                    ▼
//!                 error ──close──► disconnected ──timer──► connecting
//! ```
//!
//! `disconnect()` moves to `disconnected` directly and cancels any pending
//! reconnection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::channel::ChannelConfig;
use crate::error::{Error, Result};
use crate::hub::{Flow, Hub};
use crate::identifiers::{IdSequence, LinkId};
use crate::protocol::{ConnectionStatus, InboundMessage, OutboundMessage};

use super::connection::{CloseInfo, LinkHandle, LinkObserver, new_link};
use super::fault::{FaultKind, TransportFault};
use super::reconnect::{Backoff, ReconnectPolicy, ReconnectState, saturating_millis};

// ============================================================================
// Types
// ============================================================================

/// Phase of the current link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkPhase {
    Connecting,
    Open,
}

/// The link the transport currently owns.
struct ActiveLink {
    handle: LinkHandle,
    phase: LinkPhase,
}

/// A scheduled reconnection.
struct PendingTimer {
    seq: u64,
    task: JoinHandle<()>,
}

/// Mutable transport state.
struct TransportState {
    link: Option<ActiveLink>,
    reconnect: ReconnectState,
    timer: Option<PendingTimer>,
    timer_seq: u64,
}

impl TransportState {
    fn current(&self, id: LinkId) -> Option<&ActiveLink> {
        self.link.as_ref().filter(|link| link.handle.id() == id)
    }

    fn is_current(&self, id: LinkId) -> bool {
        self.current(id).is_some()
    }

    /// Status derived from the link phase alone.
    fn derived_status(&self) -> ConnectionStatus {
        match self.link.as_ref().map(|link| link.phase) {
            None => ConnectionStatus::Disconnected,
            Some(LinkPhase::Connecting) => ConnectionStatus::Connecting,
            Some(LinkPhase::Open) => ConnectionStatus::Connected,
        }
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Self-healing WebSocket transport.
///
/// Cloning yields another handle to the same transport. When the last
/// handle is dropped the link is closed and pending timers are cancelled.
///
/// # Example
///
/// ```no_run
/// use healing_socket::{ChannelConfig, Transport};
///
/// # async fn example() -> healing_socket::Result<()> {
/// let config = ChannelConfig::new("ws://127.0.0.1:9000".parse()?);
/// let transport = Transport::new(&config);
///
/// let _sub = transport.messages().subscribe(|msg| println!("{}: {}", msg.kind, msg.payload));
/// transport.connect();
///
/// if !transport.send(serde_json::json!({ "action": "ping" })) {
///     eprintln!("not connected yet");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

pub(crate) struct TransportInner {
    endpoint: Url,
    messages: Hub<InboundMessage>,
    status_events: Hub<ConnectionStatus>,
    faults: Hub<TransportFault>,
    state: Mutex<TransportState>,
    links: IdSequence,
    weak: Weak<TransportInner>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("status", &self.status())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Transport - Constructor
// ============================================================================

impl Transport {
    /// Creates a disconnected transport for the configured endpoint.
    #[must_use]
    pub fn new(config: &ChannelConfig) -> Self {
        let inner = Arc::new_cyclic(|weak| TransportInner {
            endpoint: config.endpoint.clone(),
            messages: Hub::with_history(config.history_capacity),
            status_events: Hub::with_history(config.history_capacity),
            faults: Hub::with_history(config.history_capacity),
            state: Mutex::new(TransportState {
                link: None,
                reconnect: ReconnectState::new(config.reconnect),
                timer: None,
                timer_seq: 0,
            }),
            links: IdSequence::default(),
            weak: weak.clone(),
        });

        Self { inner }
    }
}

// ============================================================================
// Transport - Lifecycle
// ============================================================================

impl Transport {
    /// Opens the link.
    ///
    /// No-op if already connected. A link still connecting is replaced, so
    /// at most one physical connection exists. A pending reconnection timer
    /// is left in place; when it fires against a connected transport it does
    /// nothing.
    ///
    /// Must be called from within a tokio runtime. Otherwise the status
    /// becomes `error` and a [`FaultKind::Runtime`](super::FaultKind::Runtime)
    /// fault is published.
    pub fn connect(&self) {
        match Handle::try_current() {
            Ok(runtime) => self.inner.connect_on(&runtime),
            Err(e) => {
                error!(error = %e, "connect() called outside a tokio runtime");
                self.inner.set_status(ConnectionStatus::Error);
                self.inner.faults.publish(TransportFault::runtime(e.to_string()));
            }
        }
    }

    /// Sends a message.
    ///
    /// Returns `false` without sending if the link is not open or the
    /// message cannot be encoded. A `true` return means the frame was queued
    /// on the open link; write failures are reported on the fault hub.
    pub fn send(&self, message: impl Into<OutboundMessage>) -> bool {
        let frame = match message.into().encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode outbound message");
                return false;
            }
        };

        let state = self.inner.state.lock();
        let Some(link) = state
            .link
            .as_ref()
            .filter(|link| link.phase == LinkPhase::Open)
        else {
            warn!(status = %state.derived_status(), "Cannot send: not connected");
            return false;
        };

        if link.handle.send_frame(frame) {
            trace!(link = %link.handle.id(), "Frame queued");
            true
        } else {
            warn!(link = %link.handle.id(), "Cannot send: event loop stopped");
            false
        }
    }

    /// Closes the link on purpose.
    ///
    /// Cancels any pending reconnection, sends a normal-closure frame and
    /// resets the attempt count. No automatic reconnection happens until
    /// [`connect`](Self::connect) is called again.
    pub fn disconnect(&self) {
        let link = {
            let mut state = self.inner.state.lock();
            if let Some(timer) = state.timer.take() {
                timer.task.abort();
                debug!("Cancelled pending reconnection");
            }
            state.reconnect.reset();
            state.link.take()
        };

        if let Some(link) = link {
            info!(link = %link.handle.id(), "Disconnecting");
            link.handle.close();
        }

        if self.observed_status() != ConnectionStatus::Disconnected {
            self.inner.set_status(ConnectionStatus::Disconnected);
        }
    }

    /// Waits until the link is open.
    ///
    /// Returns immediately if already connected. Does not start a
    /// connection; call [`connect`](Self::connect) first.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if `limit` elapses or reconnection gives up
    pub async fn wait_connected(&self, limit: Duration) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let opened = tx.clone();
        let _status = self
            .inner
            .status_events
            .subscribe_with(move |status| {
                if *status != ConnectionStatus::Connected {
                    return Flow::Continue;
                }
                let _ = opened.send(Ok(()));
                Flow::Stop
            })
            .guard();

        let _faults = self
            .inner
            .faults
            .subscribe_with(move |fault| {
                if !matches!(fault.kind, FaultKind::ReconnectExhausted { .. }) {
                    return Flow::Continue;
                }
                let _ = tx.send(Err(fault.message.clone()));
                Flow::Stop
            })
            .guard();

        if self.is_connected() {
            return Ok(());
        }

        match timeout(limit, rx.recv()).await {
            Ok(Some(Ok(()))) => Ok(()),
            Ok(Some(Err(message))) => Err(Error::connection(message)),
            Ok(None) => Err(Error::ConnectionClosed),
            Err(_) => Err(Error::connection(format!(
                "Not connected to {} within {}ms",
                self.inner.endpoint,
                saturating_millis(limit)
            ))),
        }
    }
}

// ============================================================================
// Transport - Accessors
// ============================================================================

impl Transport {
    /// Returns the status derived from the current link.
    ///
    /// `disconnected` without a link, `connecting` while dialing,
    /// `connected` once open. Never `error`; see
    /// [`observed_status`](Self::observed_status) for the last published value.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.inner.state.lock().derived_status()
    }

    /// Returns the last status published on the status hub.
    #[must_use]
    pub fn observed_status(&self) -> ConnectionStatus {
        self.inner.status_events.last().unwrap_or_default()
    }

    /// Returns `true` if the link is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Returns retries made since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.state.lock().reconnect.attempt_count()
    }

    /// Returns `true` while a reconnection timer is pending.
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    /// Returns the reconnection policy.
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        *self.inner.state.lock().reconnect.policy()
    }

    /// Returns the endpoint address.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Hub receiving every decoded inbound message.
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &Hub<InboundMessage> {
        &self.inner.messages
    }

    /// Hub receiving every status transition.
    #[inline]
    #[must_use]
    pub fn status_events(&self) -> &Hub<ConnectionStatus> {
        &self.inner.status_events
    }

    /// Hub receiving transport faults.
    #[inline]
    #[must_use]
    pub fn faults(&self) -> &Hub<TransportFault> {
        &self.inner.faults
    }
}

// ============================================================================
// TransportInner
// ============================================================================

impl TransportInner {
    fn set_status(&self, status: ConnectionStatus) {
        debug!(%status, "Status changed");
        self.status_events.publish(status);
    }

    fn connect_on(&self, runtime: &Handle) {
        let (id, pending) = {
            let mut state = self.state.lock();

            if let Some(link) = &state.link {
                if link.phase == LinkPhase::Open {
                    debug!(link = %link.handle.id(), "Already connected");
                    return;
                }
                debug!(link = %link.handle.id(), "Replacing link still connecting");
            }

            let id = self.links.next_link();
            let (handle, pending) = new_link(id);
            // Dropping the previous handle ends its event loop
            state.link = Some(ActiveLink {
                handle,
                phase: LinkPhase::Connecting,
            });
            (id, pending)
        };

        info!(link = %id, endpoint = %self.endpoint, "Connecting");
        self.set_status(ConnectionStatus::Connecting);
        pending.spawn(self.endpoint.clone(), self.weak.clone(), runtime);
    }

    /// Schedules one reconnection, replacing any pending timer.
    fn schedule_reconnect(&self, state: &mut TransportState, delay: Duration) {
        if let Some(previous) = state.timer.take() {
            previous.task.abort();
        }

        state.timer_seq += 1;
        let seq = state.timer_seq;
        let weak = self.weak.clone();

        let task = tokio::spawn(async move {
            sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };

            {
                let mut state = inner.state.lock();
                if state.timer.as_ref().is_none_or(|timer| timer.seq != seq) {
                    return;
                }
                state.timer = None;
            }

            debug!("Reconnection timer fired");
            inner.connect_on(&Handle::current());
        });

        state.timer = Some(PendingTimer { seq, task });
    }
}

impl Drop for TransportInner {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.task.abort();
        }
    }
}

// ============================================================================
// TransportInner - Link Events
// ============================================================================

impl LinkObserver for TransportInner {
    fn link_opened(&self, id: LinkId) {
        {
            let mut state = self.state.lock();
            let Some(link) = state.link.as_mut().filter(|link| link.handle.id() == id) else {
                trace!(link = %id, "Ignoring open from stale link");
                return;
            };
            link.phase = LinkPhase::Open;
            state.reconnect.reset();
        }

        info!(link = %id, "Connected");
        self.set_status(ConnectionStatus::Connected);
    }

    fn link_frame(&self, id: LinkId, text: &str) {
        if !self.state.lock().is_current(id) {
            trace!(link = %id, "Ignoring frame from stale link");
            return;
        }

        let message = InboundMessage::decode(text);
        debug!(link = %id, kind = %message.kind, "Message received");
        self.messages.publish(message);
    }

    fn link_error(&self, id: LinkId, message: String) {
        if !self.state.lock().is_current(id) {
            return;
        }

        error!(link = %id, error = %message, "Transport error");
        self.set_status(ConnectionStatus::Error);
        self.faults.publish(TransportFault::transport(message));
    }

    fn link_send_failed(&self, id: LinkId, message: String) {
        if !self.state.lock().is_current(id) {
            return;
        }

        self.faults.publish(TransportFault::send(message));
    }

    fn link_closed(&self, id: LinkId, close: CloseInfo) {
        let (backoff, max_attempts) = {
            let mut state = self.state.lock();
            if !state.is_current(id) {
                trace!(link = %id, "Ignoring close from stale link");
                return;
            }
            state.link = None;

            let backoff = state.reconnect.on_unintended_close();
            if let Backoff::Retry { delay, .. } = backoff {
                self.schedule_reconnect(&mut state, delay);
            }
            (backoff, state.reconnect.policy().max_attempts)
        };

        info!(
            link = %id,
            code = ?close.code,
            reason = %close.reason,
            was_clean = close.was_clean,
            "Disconnected"
        );
        self.set_status(ConnectionStatus::Disconnected);

        match backoff {
            Backoff::Retry { attempt, delay } => {
                info!(
                    attempt,
                    max_attempts,
                    delay_ms = saturating_millis(delay),
                    "Reconnecting"
                );
            }
            Backoff::Exhausted { attempts } => {
                error!(attempts, "Maximum reconnection attempts reached");
                self.faults
                    .publish(TransportFault::reconnect_exhausted(attempts));
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> Transport {
        let config = ChannelConfig::new(Url::parse("ws://127.0.0.1:9").unwrap());
        Transport::new(&config)
    }

    #[test]
    fn test_new_transport_is_disconnected() {
        let transport = transport();
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);
        assert_eq!(transport.observed_status(), ConnectionStatus::Disconnected);
        assert_eq!(transport.reconnect_attempts(), 0);
        assert!(!transport.reconnect_pending());
    }

    #[test]
    fn test_send_while_disconnected_returns_false() {
        let transport = transport();
        assert!(!transport.send("hello"));
        assert!(!transport.send(serde_json::json!({"action": "x"})));
    }

    #[test]
    fn test_connect_outside_runtime_reports_fault() {
        let transport = transport();
        let faults = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&faults);
        let _sub = transport
            .faults()
            .subscribe(move |fault: &TransportFault| sink.lock().push(fault.kind));

        transport.connect();

        assert_eq!(transport.observed_status(), ConnectionStatus::Error);
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);
        assert_eq!(*faults.lock(), vec![FaultKind::Runtime]);
    }

    #[test]
    fn test_disconnect_when_idle_is_quiet() {
        let transport = transport();
        transport.disconnect();
        assert_eq!(transport.status_events().count(), 0);
    }

    #[tokio::test]
    async fn test_connect_publishes_connecting() {
        let transport = transport();
        transport.connect();

        assert_eq!(transport.status_events().history()[0], ConnectionStatus::Connecting);
        transport.disconnect();
        assert_eq!(transport.status(), ConnectionStatus::Disconnected);
        assert_eq!(transport.observed_status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_connected_times_out_when_idle() {
        let transport = transport();

        let err = transport
            .wait_connected(Duration::from_millis(250))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Connection { .. }));
        assert_eq!(transport.status_events().subscriber_count(), 0);
        assert_eq!(transport.faults().subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_connected_fails_when_reconnection_gives_up() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = Url::parse(&format!("ws://127.0.0.1:{port}")).unwrap();
        let config = ChannelConfig::new(endpoint)
            .with_reconnect(ReconnectPolicy::new(0, Duration::from_millis(10)));
        let transport = Transport::new(&config);

        transport.connect();
        let err = transport
            .wait_connected(Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("abandoned after 0 attempts"));
        assert!(!transport.reconnect_pending());
    }
}
