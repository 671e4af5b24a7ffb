//! Gateway entry point: one listener, two sub-servers.
//!
//! [`Gateway::bind`] takes the port; [`Gateway::run`] drives the
//! demultiplexer, the HTTP ops server and the gRPC server until the
//! listener fails or `shutdown` resolves. TLS, when configured, applies to
//! the gRPC side only.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tonic::transport::Server;

use tenantmux_core::error::{Result, TenantMuxError};

use crate::app_state::AppState;
use crate::router;
use crate::rpc::{GreeterServer, GreeterService};
use crate::transport::demux::Routed;
use crate::transport::http::serve_http;
use crate::transport::{DemuxOutputs, Demultiplexer, TlsSettings};

/// Connections queued per sub-server before the demultiplexer waits.
const ROUTE_BACKLOG: usize = 128;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub listen: SocketAddr,
    pub sniff_timeout: Duration,
    pub tls: TlsSettings,
}

pub struct Gateway {
    state: AppState,
    demux: Demultiplexer,
    outputs: DemuxOutputs,
    rpc_server: Server,
}

impl Gateway {
    pub async fn bind(state: AppState, opts: &ServerOptions) -> Result<Self> {
        let mut rpc_server = Server::builder();
        if let Some(tls) = opts.tls.server_config()? {
            rpc_server = rpc_server
                .tls_config(tls)
                .map_err(|e| TenantMuxError::BadConfig(format!("failed to set up TLS: {e}")))?;
        }

        let listener = TcpListener::bind(opts.listen)
            .await
            .map_err(|e| TenantMuxError::ListenerFatal(format!("failed to listen on {}: {e}", opts.listen)))?;
        let (demux, outputs) = Demultiplexer::new(listener, opts.sniff_timeout, ROUTE_BACKLOG);
        Ok(Self { state, demux, outputs, rpc_server })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.demux.local_addr()
    }

    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Gateway { state, demux, outputs, rpc_server } = self;
        let DemuxOutputs { http, rpc } = outputs;
        let (stop_tx, stop_rx) = watch::channel(false);

        let http_task = tokio::spawn(serve_http(
            router::build_router(state.clone()),
            http,
            wait_for_shutdown(stop_rx.clone()),
        ));
        let rpc_task = tokio::spawn(serve_rpc(rpc_server, state, rpc, wait_for_shutdown(stop_rx)));

        let result = tokio::select! {
            r = demux.serve() => r,
            _ = shutdown => {
                tracing::info!("shutdown requested");
                Ok(())
            }
        };

        let _ = stop_tx.send(true);
        let _ = http_task.await;
        let _ = rpc_task.await;
        result
    }
}

async fn serve_rpc<F>(mut server: Server, state: AppState, conns: Routed, shutdown: F)
where
    F: Future<Output = ()>,
{
    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<GreeterServer<GreeterService>>()
        .await;

    let greeter = GreeterServer::new(GreeterService::new(
        state.chain().clone(),
        state.reply_builder(),
    ));
    let incoming = ReceiverStream::new(conns).map(Ok::<_, std::io::Error>);

    let result = server
        .add_service(health_service)
        .add_service(greeter)
        .serve_with_incoming_shutdown(incoming, shutdown)
        .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "rpc server error");
    }
    tracing::info!("rpc sub-server stopped");
}

/// Resolves once the watch value becomes `true` or the sender is gone.
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            break;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}
