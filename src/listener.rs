//! Listener lifecycle manager
//!
//! Owns one listening socket, accepts connections sequentially, and
//! terminates cleanly on an external stop request. The socket is
//! released exactly once no matter which path ends the loop.

use crate::config::ServerConfig;
use crate::error::{DoormanError, Result};
use crate::handler::{ConnectionHandler, PeerConnection};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Whether the accept loop should keep going. Set to `Stopping` by
/// [`Server::shutdown`], read by the loop before each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopping,
}

const RUN_STATE_RUNNING: u8 = 0;
const RUN_STATE_STOPPING: u8 = 1;

/// Lifecycle of the listening socket.
///
/// `Uninitialized → Listening → Stopping → Closed`; `Closed` is
/// terminal. A handle only exists from `Listening` onward — before
/// `initialize` succeeds there is nothing to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Listening,
    Stopping,
    Closed,
}

/// The bound, listening socket.
///
/// The listener is stored as an `Option` so the closed state is
/// explicit: [`close`](ListenerHandle::close) takes it out exactly
/// once, and a second close is a no-op rather than an error.
pub struct ListenerHandle {
    inner: Option<TcpListener>,
    local_addr: SocketAddr,
    state: LifecycleState,
}

impl ListenerHandle {
    fn new(listener: TcpListener) -> Result<Self> {
        let local_addr = listener.local_addr()?;
        Ok(Self {
            inner: Some(listener),
            local_addr,
            state: LifecycleState::Listening,
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LifecycleState::Closed
    }

    /// Wait for the next incoming connection.
    pub async fn accept(&self) -> Result<PeerConnection> {
        let listener = self.inner.as_ref().ok_or(DoormanError::Closed)?;
        let (stream, peer_addr) = listener.accept().await?;
        Ok(PeerConnection::new(stream, peer_addr))
    }

    fn begin_stop(&mut self) {
        if self.state == LifecycleState::Listening {
            self.state = LifecycleState::Stopping;
        }
    }

    /// Release the listening socket. Idempotent: closing an
    /// already-closed handle does nothing.
    pub fn close(&mut self) {
        if let Some(listener) = self.inner.take() {
            drop(listener);
        }
        self.state = LifecycleState::Closed;
    }
}

/// doorman TCP server: binds the listener, runs the accept loop, and
/// coordinates shutdown between the loop and the signal watcher.
pub struct Server {
    config: ServerConfig,
    handler: Arc<dyn ConnectionHandler>,
    run_state: AtomicU8,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new server instance with the given connection handler.
    pub fn new(config: ServerConfig, handler: Arc<dyn ConnectionHandler>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            handler,
            run_state: AtomicU8::new(RUN_STATE_RUNNING),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn run_state(&self) -> RunState {
        match self.run_state.load(Ordering::SeqCst) {
            RUN_STATE_RUNNING => RunState::Running,
            _ => RunState::Stopping,
        }
    }

    /// Resolve the bind address, create a socket for its family, bind
    /// it, and put it into listening mode with the configured backlog.
    ///
    /// Failures here are unrecoverable startup errors; the caller is
    /// expected to report them and exit rather than retry.
    pub async fn initialize(&self) -> Result<ListenerHandle> {
        let addr = self.config.bind_addr()?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(|source| DoormanError::Bind { addr, source })?;

        // Restarts should not trip over lingering TIME_WAIT entries.
        socket
            .set_reuseaddr(true)
            .map_err(|source| DoormanError::Bind { addr, source })?;
        socket
            .bind(addr)
            .map_err(|source| DoormanError::Bind { addr, source })?;

        let listener = socket
            .listen(self.config.backlog)
            .map_err(|source| DoormanError::Bind { addr, source })?;

        let handle = ListenerHandle::new(listener)?;
        info!(
            addr = %handle.local_addr(),
            backlog = self.config.backlog,
            "listening"
        );
        Ok(handle)
    }

    /// Run the accept loop until [`shutdown`](Server::shutdown) is
    /// called. The handle is closed exactly once on exit, whichever
    /// way the loop ends.
    ///
    /// Connections are dispatched to the handler synchronously, one at
    /// a time, in accept order. A failed accept is logged and the loop
    /// continues; it never terminates the server.
    pub async fn run(&self, handle: &mut ListenerHandle) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        while self.run_state() == RunState::Running {
            info!("accepting connections");

            tokio::select! {
                result = handle.accept() => {
                    match result {
                        Ok(conn) => {
                            info!("got a connection from {}", conn.peer_addr());
                            if let Err(e) = self.handler.handle(conn).await {
                                error!("connection handler failed: {}", e);
                            }
                        }
                        // The handle was released out from under us;
                        // treat it like a stop request.
                        Err(DoormanError::Closed) => break,
                        Err(e) => {
                            warn!("failed to accept connection: {}", e);
                        }
                    }
                }

                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        handle.begin_stop();
        handle.close();
        info!("listener closed");
        Ok(())
    }

    /// Request a graceful stop: flip the run state and wake the accept
    /// loop out of its blocking accept.
    ///
    /// Idempotent and infallible — if the loop has already exited
    /// there is nobody to notify and nothing left to do.
    pub fn shutdown(&self) {
        self.run_state.store(RUN_STATE_STOPPING, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(());
    }
}
