//! WebSocket link and event loop.
//!
//! A link is one physical connection attempt. [`new_link`] creates its
//! handle, and [`PendingLink::spawn`] starts a tokio task that dials the
//! endpoint and then handles:
//!
//! - Incoming text frames (forwarded to the observer)
//! - Outgoing frames queued through the [`LinkHandle`]
//! - Close requests and remote closes
//!
//! Lifecycle events are reported to a [`LinkObserver`] held weakly, so a
//! dropped transport ends its links instead of being kept alive by them.
//! Dropping the [`LinkHandle`] closes the link.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Weak;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, trace, warn};
use url::Url;

use crate::identifiers::LinkId;

// ============================================================================
// Constants
// ============================================================================

/// Reason sent with a client-initiated close.
pub(crate) const CLIENT_CLOSE_REASON: &str = "client disconnect";

// ============================================================================
// LinkCommand
// ============================================================================

/// Commands for the event loop.
pub(crate) enum LinkCommand {
    /// Write a text frame.
    Frame(String),
    /// Send a close frame and stop.
    Close { code: CloseCode, reason: String },
}

// ============================================================================
// CloseInfo
// ============================================================================

/// How a link ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// Close code, if a close frame was exchanged.
    pub code: Option<u16>,
    /// Close reason, or a description of the failure.
    pub reason: String,
    /// `true` if the close handshake happened.
    pub was_clean: bool,
}

impl CloseInfo {
    /// A close without handshake (network failure, refused dial).
    pub(crate) fn abnormal(reason: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: reason.into(),
            was_clean: false,
        }
    }

    /// A close initiated locally.
    pub(crate) fn local(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            reason: reason.into(),
            was_clean: true,
        }
    }

    /// A close frame received from the remote end.
    fn remote(frame: Option<&CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self {
                code: Some(frame.code.into()),
                reason: frame.reason.to_string(),
                was_clean: true,
            },
            None => Self {
                code: None,
                reason: String::new(),
                was_clean: true,
            },
        }
    }
}

// ============================================================================
// LinkObserver
// ============================================================================

/// Receives lifecycle events from link tasks.
///
/// Each call carries the [`LinkId`] so the observer can ignore links it
/// has already replaced.
pub(crate) trait LinkObserver: Send + Sync + 'static {
    /// The WebSocket handshake completed.
    fn link_opened(&self, link: LinkId);
    /// A text frame arrived.
    fn link_frame(&self, link: LinkId, text: &str);
    /// The connection failed. A close follows.
    fn link_error(&self, link: LinkId, message: String);
    /// A queued frame could not be written.
    fn link_send_failed(&self, link: LinkId, message: String);
    /// The link ended. Not reported for links abandoned while dialing.
    fn link_closed(&self, link: LinkId, close: CloseInfo);
}

// ============================================================================
// LinkHandle
// ============================================================================

/// Owner side of a running link.
pub(crate) struct LinkHandle {
    id: LinkId,
    commands: mpsc::UnboundedSender<LinkCommand>,
}

impl LinkHandle {
    #[inline]
    pub(crate) fn id(&self) -> LinkId {
        self.id
    }

    /// Queues a text frame. Returns `false` if the event loop has stopped.
    pub(crate) fn send_frame(&self, frame: String) -> bool {
        self.commands.send(LinkCommand::Frame(frame)).is_ok()
    }

    /// Asks the event loop to close with a normal-closure code.
    pub(crate) fn close(self) {
        let _ = self.commands.send(LinkCommand::Close {
            code: CloseCode::Normal,
            reason: CLIENT_CLOSE_REASON.to_string(),
        });
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Event loop side of a link that has not been started yet.
pub(crate) struct PendingLink {
    id: LinkId,
    command_rx: mpsc::UnboundedReceiver<LinkCommand>,
}

impl PendingLink {
    /// Starts dialing `endpoint` on `runtime`.
    pub(crate) fn spawn<O: LinkObserver>(self, endpoint: Url, observer: Weak<O>, runtime: &Handle) {
        runtime.spawn(run_link(self.id, endpoint, self.command_rx, observer));
    }
}

/// Creates both ends of a new link.
///
/// The handle can be stored before the loop starts, so the owner can record
/// the link before any event from it arrives.
pub(crate) fn new_link(id: LinkId) -> (LinkHandle, PendingLink) {
    let (commands, command_rx) = mpsc::unbounded_channel();
    (LinkHandle { id, commands }, PendingLink { id, command_rx })
}

/// Calls the observer if it still exists.
fn notify<O>(observer: &Weak<O>, event: impl FnOnce(&O)) -> bool {
    match observer.upgrade() {
        Some(observer) => {
            event(&observer);
            true
        }
        None => false,
    }
}

async fn run_link<O: LinkObserver>(
    id: LinkId,
    endpoint: Url,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
    observer: Weak<O>,
) {
    // Any command while dialing means the owner gave up on this link
    let ws_stream = tokio::select! {
        result = connect_async(endpoint.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                warn!(link = %id, error = %e, "WebSocket connect failed");
                notify(&observer, |o| o.link_error(id, e.to_string()));
                notify(&observer, |o| o.link_closed(id, CloseInfo::abnormal(e.to_string())));
                return;
            }
        },

        _ = command_rx.recv() => {
            debug!(link = %id, "Link abandoned while connecting");
            return;
        }
    };

    if !notify(&observer, |o| o.link_opened(id)) {
        return;
    }

    let (mut ws_write, mut ws_read) = ws_stream.split();

    let close = loop {
        tokio::select! {
            // Incoming frames from the server
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        trace!(link = %id, len = text.len(), "Frame received");
                        if !notify(&observer, |o| o.link_frame(id, &text)) {
                            let _ = ws_write.close().await;
                            return;
                        }
                    }

                    Some(Ok(Message::Close(frame))) => {
                        debug!(link = %id, "WebSocket closed by remote");
                        break CloseInfo::remote(frame.as_ref());
                    }

                    Some(Ok(Message::Binary(data))) => {
                        trace!(link = %id, len = data.len(), "Ignoring binary frame");
                    }

                    Some(Err(e)) => {
                        warn!(link = %id, error = %e, "WebSocket error");
                        notify(&observer, |o| o.link_error(id, e.to_string()));
                        break CloseInfo::abnormal(e.to_string());
                    }

                    None => {
                        debug!(link = %id, "WebSocket stream ended");
                        break CloseInfo::abnormal("stream ended");
                    }

                    // Ping/Pong are answered by tungstenite
                    _ => {}
                }
            }

            // Commands from the transport
            command = command_rx.recv() => {
                match command {
                    Some(LinkCommand::Frame(frame)) => {
                        if let Err(e) = ws_write.send(Message::Text(frame.into())).await {
                            warn!(link = %id, error = %e, "Failed to send frame");
                            notify(&observer, |o| o.link_send_failed(id, e.to_string()));
                        } else {
                            trace!(link = %id, "Frame sent");
                        }
                    }

                    Some(LinkCommand::Close { code, reason }) => {
                        let frame = CloseFrame {
                            code,
                            reason: reason.clone().into(),
                        };
                        if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
                            debug!(link = %id, error = %e, "Close frame not delivered");
                        }
                        break CloseInfo::local(code, reason);
                    }

                    None => {
                        debug!(link = %id, "Link handle dropped");
                        let _ = ws_write.close().await;
                        break CloseInfo::local(CloseCode::Normal, CLIENT_CLOSE_REASON);
                    }
                }
            }
        }
    };

    notify(&observer, |o| o.link_closed(id, close));
    debug!(link = %id, "Event loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
