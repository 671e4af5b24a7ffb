//! HTTP/1.1 sub-server fed by the demultiplexer.
//!
//! `axum::serve` only takes a bound listener, so connections are served
//! directly with hyper's http1 builder over the routed streams.

use std::future::Future;

use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;

use super::demux::Routed;

pub async fn serve_http<F>(router: Router, mut conns: Routed, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        let conn = tokio::select! {
            c = conns.recv() => match c {
                Some(c) => c,
                None => break,
            },
            _ = &mut shutdown => break,
        };

        let svc = TowerToHyperService::new(router.clone());
        tokio::spawn(async move {
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(conn), svc)
                .await
            {
                tracing::debug!(error = %e, "http connection error");
            }
        });
    }
    tracing::info!("http sub-server stopped");
}
