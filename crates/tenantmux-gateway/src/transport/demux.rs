//! Single-listener protocol demultiplexer.
//!
//! Owns the shared `TcpListener`. Every accepted connection is sniffed in
//! its own task, so a slow or silent client never delays the accept loop,
//! and then handed to exactly one sub-server through a channel. Each
//! sub-server runs its own accept loop over its receiver.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use tenantmux_core::error::{Result, TenantMuxError};

use super::sniff::{sniff, Protocol, SniffedStream};

/// Connections routed to one sub-server.
pub type Routed = mpsc::Receiver<SniffedStream<TcpStream>>;

/// Receiving ends of the demultiplexer, one per sub-server.
pub struct DemuxOutputs {
    pub http: Routed,
    pub rpc: Routed,
}

pub struct Demultiplexer {
    listener: TcpListener,
    http_tx: mpsc::Sender<SniffedStream<TcpStream>>,
    rpc_tx: mpsc::Sender<SniffedStream<TcpStream>>,
    sniff_timeout: Duration,
}

impl Demultiplexer {
    pub fn new(listener: TcpListener, sniff_timeout: Duration, backlog: usize) -> (Self, DemuxOutputs) {
        let (http_tx, http) = mpsc::channel(backlog.max(1));
        let (rpc_tx, rpc) = mpsc::channel(backlog.max(1));
        (
            Self {
                listener,
                http_tx,
                rpc_tx,
                sniff_timeout,
            },
            DemuxOutputs { http, rpc },
        )
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| TenantMuxError::ListenerFatal(e.to_string()))
    }

    /// Accept until the listener fails or both sub-servers are gone.
    ///
    /// An accept error is returned as `ListenerFatal`; nothing can make
    /// progress without the listener.
    pub async fn serve(self) -> Result<()> {
        loop {
            if self.http_tx.is_closed() && self.rpc_tx.is_closed() {
                tracing::info!("all sub-servers stopped, demultiplexer exiting");
                return Ok(());
            }

            let (stream, peer) = self.listener.accept().await.map_err(|e| {
                tracing::error!(error = %e, "accept failed");
                TenantMuxError::ListenerFatal(e.to_string())
            })?;

            let _ = stream.set_nodelay(true);
            let http_tx = self.http_tx.clone();
            let rpc_tx = self.rpc_tx.clone();
            let sniff_timeout = self.sniff_timeout;
            tokio::spawn(async move {
                route(stream, peer, sniff_timeout, http_tx, rpc_tx).await;
            });
        }
    }
}

async fn route(
    stream: TcpStream,
    peer: SocketAddr,
    sniff_timeout: Duration,
    http_tx: mpsc::Sender<SniffedStream<TcpStream>>,
    rpc_tx: mpsc::Sender<SniffedStream<TcpStream>>,
) {
    let sniffed = match tokio::time::timeout(sniff_timeout, sniff(stream)).await {
        Ok(Ok(Some(s))) => s,
        Ok(Ok(None)) => {
            tracing::debug!(%peer, "connection closed before first byte");
            return;
        }
        Ok(Err(e)) => {
            tracing::debug!(%peer, error = %e, "sniff read failed");
            return;
        }
        Err(_) => {
            tracing::debug!(%peer, "sniff timed out");
            return;
        }
    };

    let (proto, conn) = sniffed;
    let tx = match proto {
        Protocol::Http1 => &http_tx,
        Protocol::Rpc => &rpc_tx,
    };
    tracing::trace!(%peer, ?proto, "routing connection");
    if tx.send(conn).await.is_err() {
        tracing::warn!(%peer, ?proto, "sub-server stopped, dropping connection");
    }
}
