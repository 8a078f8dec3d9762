//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing_subscriber::EnvFilter;

use healing_socket::{Channel, ConnectionStatus, Hub, Subscription};

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

pub type ServerSocket = WebSocketStream<TcpStream>;

// ============================================================================
// Tracing
// ============================================================================

/// Installs a test subscriber once. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// TestServer
// ============================================================================

/// Local websocket server bound to a random port.
pub struct TestServer {
    listener: TcpListener,
    port: u16,
}

impl TestServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let port = listener.local_addr().expect("local addr").port();
        Self { listener, port }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Accepts one client and completes the websocket handshake.
    pub async fn accept(&self) -> ServerSocket {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("client should connect")
            .expect("accept");
        accept_async(stream).await.expect("websocket handshake")
    }

    /// Asserts that no client connects within `within`.
    pub async fn expect_no_client(&self, within: Duration) {
        let accepted = timeout(within, self.listener.accept()).await;
        assert!(accepted.is_err(), "unexpected client connection");
    }

    /// Returns a URL nothing listens on.
    pub async fn refused_url() -> String {
        let server = Self::bind().await;
        server.ws_url()
    }
}

/// Reads the next text frame, skipping control frames.
pub async fn next_text(socket: &mut ServerSocket) -> String {
    timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(Message::Close(_))) | None => panic!("socket closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("read failed: {e}"),
            }
        }
    })
    .await
    .expect("text frame should arrive")
}

/// Waits for the client's close frame, returning its code.
pub async fn next_close(socket: &mut ServerSocket) -> Option<u16> {
    timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("read failed before close: {e}"),
                None => panic!("socket ended without a close frame"),
            }
        }
    })
    .await
    .expect("close frame should arrive")
}

pub async fn send_text(socket: &mut ServerSocket, text: &str) {
    socket
        .send(Message::Text(text.into()))
        .await
        .expect("server send");
}

// ============================================================================
// Waiting
// ============================================================================

/// Polls `check` until it holds or [`WAIT`] elapses.
pub async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    let reached = timeout(WAIT, async {
        while !check() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {what}");
}

// ============================================================================
// Collectors
// ============================================================================

/// Records everything published on a hub.
pub struct Collector<T> {
    items: Arc<Mutex<Vec<T>>>,
    _subscription: Subscription,
}

impl<T: Clone + Send + 'static> Collector<T> {
    pub fn attach(hub: &Hub<T>) -> Self {
        let items = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&items);
        let subscription = hub.subscribe(move |item: &T| sink.lock().push(item.clone()));
        Self {
            items,
            _subscription: subscription,
        }
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }
}

impl Collector<ConnectionStatus> {
    pub fn count_of(&self, status: ConnectionStatus) -> usize {
        self.items.lock().iter().filter(|s| **s == status).count()
    }
}

/// Builds a channel against `url` with fast reconnection.
pub fn channel(url: &str, max_attempts: u32, base_delay: Duration) -> Channel {
    Channel::builder()
        .endpoint(url)
        .max_reconnect_attempts(max_attempts)
        .reconnect_base_delay(base_delay)
        .build()
        .expect("valid test channel")
}
