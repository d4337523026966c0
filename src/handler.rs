//! Connection handler boundary
//!
//! The lifecycle manager hands each accepted connection to a
//! [`ConnectionHandler`]; real protocol logic plugs in here without
//! touching the accept loop. The default [`DiscardHandler`] closes
//! every connection without exchanging data.

use crate::error::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// One accepted connection: the stream and the remote address.
///
/// The handler owns the connection for the duration of one `handle`
/// call. Dropping it closes the descriptor, so a handler cannot leak
/// a connection; [`close`](PeerConnection::close) performs an orderly
/// shutdown first.
pub struct PeerConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl PeerConnection {
    pub(crate) fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self { stream, peer_addr }
    }

    /// The remote address, as reported by accept.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Shut the connection down and close it.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Handles one accepted connection to completion.
///
/// The accept loop dispatches synchronously: `handle` runs to
/// completion before the next connection is accepted, so handlers see
/// connections in strict accept order.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    async fn handle(&self, conn: PeerConnection) -> Result<()>;
}

/// Placeholder handler that closes each connection immediately.
pub struct DiscardHandler;

#[async_trait]
impl ConnectionHandler for DiscardHandler {
    async fn handle(&self, conn: PeerConnection) -> Result<()> {
        debug!(peer = %conn.peer_addr(), "closing connection without protocol handling");
        conn.close().await
    }
}
