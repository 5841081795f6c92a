//! Unix socket transport and connection state tracking.
//!
//! The broker listens on a local Unix domain socket, so the tonic [`Channel`] is
//! built from an [`Endpoint`] with a custom connector that ignores the URI and
//! dials the socket path instead.
//!
//! # Architecture
//!
//! [`BrokerConnection`] wraps the channel with:
//! - **Deferred reachability**: Construction never dials; the readiness verifier
//!   either drives an eager connect or installs a lazy channel
//! - **State tracking**: Dial attempts publish [`ConnectionState`] transitions on a
//!   `watch` channel that readiness waits on
//! - **Shared ownership**: The channel lives in a `RwLock<Option<...>>` slot and is
//!   cloned per call; clones multiplex over one HTTP/2 connection
//! - **Terminal shutdown**: Closing cancels a lifecycle token, empties the slot and
//!   pins the state at [`ConnectionState::Shutdown`]

use std::{
    fmt,
    future::Future,
    io,
    path::{Path, PathBuf},
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use hyper_util::rt::TokioIo;
use parking_lot::RwLock;
use snafu::{OptionExt, ResultExt};
use tokio::{net::UnixStream, sync::watch};
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::Service;
use tracing::{debug, info};

use crate::{
    config::ClientConfig,
    error::{ClosedSnafu, ConnectionShutdownSnafu, NotConnectedSnafu, Result, TransportSnafu},
};

/// Placeholder authority; the connector never resolves it.
const BROKER_AUTHORITY: &str = "http://localhost";

/// HTTP/2 keep-alive interval for idle connections.
const HTTP2_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP/2 keep-alive timeout.
const HTTP2_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Usability of the broker connection as seen by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection attempt has been made.
    Idle,
    /// A socket dial is in progress.
    Connecting,
    /// The connection can carry calls.
    Ready,
    /// The last dial failed; a later attempt may succeed.
    TransientFailure,
    /// The connection has been closed. Terminal.
    Shutdown,
}

impl ConnectionState {
    /// Returns true for [`ConnectionState::Shutdown`].
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Shutdown
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::Connecting => "CONNECTING",
            Self::Ready => "READY",
            Self::TransientFailure => "TRANSIENT_FAILURE",
            Self::Shutdown => "SHUTDOWN",
        };
        f.write_str(name)
    }
}

/// Publishes connection state transitions.
#[derive(Debug)]
struct StateTracker {
    tx: watch::Sender<ConnectionState>,
    /// Set once a channel has carried a successful handshake or probe.
    established: AtomicBool,
}

impl StateTracker {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Idle);
        Self { tx, established: AtomicBool::new(false) }
    }

    fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Moves to `next` unless already there or shut down.
    fn transition(&self, next: ConnectionState) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_terminal() || *state == next {
                return false;
            }
            debug!(from = %state, to = %next, "connection state transition");
            *state = next;
            true
        })
    }

    fn dial_started(&self) {
        self.transition(ConnectionState::Connecting);
    }

    fn dial_succeeded(&self) {
        // Before first establishment a successful dial alone proves nothing
        if self.established.load(Ordering::Acquire) {
            self.transition(ConnectionState::Ready);
        }
    }

    fn dial_failed(&self) {
        self.transition(ConnectionState::TransientFailure);
    }

    fn mark_established(&self) {
        self.established.store(true, Ordering::Release);
        self.transition(ConnectionState::Ready);
    }

    fn shutdown(&self) -> ConnectionState {
        self.tx.send_replace(ConnectionState::Shutdown)
    }
}

/// Dials the broker's Unix socket for every connection tonic opens.
#[derive(Debug, Clone)]
struct UnixConnector {
    socket_path: Arc<PathBuf>,
    tracker: Arc<StateTracker>,
}

impl Service<Uri> for UnixConnector {
    type Response = TokioIo<UnixStream>;
    type Error = io::Error;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _uri: Uri) -> Self::Future {
        let socket_path = Arc::clone(&self.socket_path);
        let tracker = Arc::clone(&self.tracker);
        Box::pin(async move {
            tracker.dial_started();
            match UnixStream::connect(socket_path.as_path()).await {
                Ok(stream) => {
                    tracker.dial_succeeded();
                    Ok(TokioIo::new(stream))
                },
                Err(e) => {
                    debug!(
                        socket = %socket_path.display(),
                        error = %e,
                        "broker socket dial failed"
                    );
                    tracker.dial_failed();
                    Err(e)
                },
            }
        })
    }
}

/// Owner of the tonic channel to the broker.
#[derive(Debug)]
pub(crate) struct BrokerConnection {
    socket_path: PathBuf,
    endpoint: Endpoint,
    connector: UnixConnector,
    tracker: Arc<StateTracker>,
    channel: RwLock<Option<Channel>>,
    closed: CancellationToken,
}

impl BrokerConnection {
    /// Creates an unconnected handle. Does not touch the socket.
    pub(crate) fn new(config: &ClientConfig) -> Self {
        let tracker = Arc::new(StateTracker::new());
        let connector = UnixConnector {
            socket_path: Arc::new(config.socket_path().to_path_buf()),
            tracker: Arc::clone(&tracker),
        };
        let endpoint = Endpoint::from_static(BROKER_AUTHORITY)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .http2_keep_alive_interval(HTTP2_KEEPALIVE_INTERVAL)
            .keep_alive_timeout(HTTP2_KEEPALIVE_TIMEOUT)
            .keep_alive_while_idle(true);

        Self {
            socket_path: config.socket_path().to_path_buf(),
            endpoint,
            connector,
            tracker,
            channel: RwLock::new(None),
            closed: CancellationToken::new(),
        }
    }

    pub(crate) fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.tracker.current()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tracker.subscribe()
    }

    /// Token cancelled when the connection is closed.
    pub(crate) fn closed(&self) -> &CancellationToken {
        &self.closed
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Dials the socket and completes the HTTP/2 handshake, storing the channel
    /// and marking the connection ready on success.
    pub(crate) async fn establish(&self) -> Result<()> {
        if self.is_closed() {
            return ConnectionShutdownSnafu.fail();
        }

        let channel = match self.endpoint.connect_with_connector(self.connector.clone()).await {
            Ok(channel) => channel,
            Err(e) => {
                // A dial can succeed while the handshake fails
                self.tracker.dial_failed();
                return Err(e).context(TransportSnafu);
            },
        };

        {
            let mut slot = self.channel.write();
            if self.is_closed() {
                return ConnectionShutdownSnafu.fail();
            }
            *slot = Some(channel);
        }
        self.tracker.mark_established();
        Ok(())
    }

    /// Installs a lazily connecting channel if none is present.
    pub(crate) fn attach_lazy(&self) {
        let mut slot = self.channel.write();
        if slot.is_none() && !self.is_closed() {
            *slot = Some(self.endpoint.connect_with_connector_lazy(self.connector.clone()));
        }
    }

    /// Records that a call over the current channel succeeded.
    pub(crate) fn mark_ready(&self) {
        self.tracker.mark_established();
    }

    /// Returns a clone of the channel.
    ///
    /// # Errors
    ///
    /// Returns `Closed` after [`close`](Self::close) and `NotConnected` if no channel
    /// was ever installed.
    pub(crate) fn channel(&self) -> Result<Channel> {
        if self.is_closed() {
            return ClosedSnafu.fail();
        }
        self.channel.read().clone().context(NotConnectedSnafu)
    }

    /// Releases the channel and moves to the terminal state.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if already closed and `NotConnected` if no channel was ever
    /// installed.
    pub(crate) fn close(&self) -> Result<()> {
        let channel = {
            let mut slot = self.channel.write();
            if self.is_closed() {
                return ClosedSnafu.fail();
            }
            let channel = slot.take().context(NotConnectedSnafu)?;
            self.tracker.shutdown();
            self.closed.cancel();
            channel
        };
        drop(channel);
        info!(socket = %self.socket_path.display(), "broker connection closed");
        Ok(())
    }

    /// Tears down whatever exists without reporting lifecycle errors.
    pub(crate) fn release(&self) {
        let channel = self.channel.write().take();
        let previous = self.tracker.shutdown();
        self.closed.cancel();
        drop(channel);
        debug!(
            socket = %self.socket_path.display(),
            previous = %previous,
            "broker connection released"
        );
    }
}
