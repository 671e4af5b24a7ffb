//! Bidirectional greeting session.
//!
//! Admission already happened once for the whole stream; this loop owns the
//! resulting [`Admitted`] token and releases it when the session closes,
//! whichever way that happens.
//!
//! Lifecycle:
//! - `Receiving`: await the next inbound message (or caller cancellation)
//! - `Replying`: count the message, build one reply, send it
//! - `Closed`: end-of-input, transport error, reply failure or cancellation
//!
//! Requests are handled strictly one at a time, so replies keep the order of
//! their requests.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::{FutureExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tonic::Status;

use tenantmux_core::error::TenantMuxError;

use crate::interceptor::{panic_message, status_from_error, Admitted};
use crate::obs::TenantMetrics;
use crate::rpc::proto::{HelloReply, HelloRequest};
use crate::rpc::reply::ReplyBuilder;

/// Outbound half of a session, as consumed by the transport.
pub type ReplySender = mpsc::Sender<Result<HelloReply, Status>>;

/// Why a session reached `Closed`.
#[derive(Debug)]
pub enum SessionEnd {
    /// Caller signalled end of input. Normal close.
    ClientClosed,
    /// Caller went away (response stream dropped).
    Cancelled,
    /// Reading the next message failed.
    ReceiveFailed(Status),
    /// Building a reply failed or panicked.
    ReplyFailed(Status),
}

impl SessionEnd {
    pub fn is_error(&self) -> bool {
        matches!(self, SessionEnd::ReceiveFailed(_) | SessionEnd::ReplyFailed(_))
    }
}

#[derive(Debug)]
pub struct SessionSummary {
    /// Messages received and answered.
    pub messages: u64,
    pub end: SessionEnd,
}

pub async fn run_session<S>(
    admitted: Admitted,
    inbound: S,
    outbound: ReplySender,
    builder: Arc<dyn ReplyBuilder>,
    metrics: Arc<TenantMetrics>,
) -> SessionSummary
where
    S: Stream<Item = Result<HelloRequest, Status>>,
{
    tokio::pin!(inbound);

    let ctx = admitted.context();
    let tenant_id = ctx.tenant_id();
    let client_ip = ctx.client_ip();
    tracing::info!(%client_ip, %tenant_id, "client opened request stream");

    let mut messages = 0u64;

    let end = loop {
        let next = tokio::select! {
            biased;
            _ = outbound.closed() => break SessionEnd::Cancelled,
            next = inbound.next() => next,
        };

        let req = match next {
            None => {
                tracing::info!(%client_ip, %tenant_id, "client closed connection");
                break SessionEnd::ClientClosed;
            }
            Some(Err(status)) => {
                let err = TenantMuxError::StreamTransport(status.message().to_string());
                tracing::error!(%client_ip, %tenant_id, error = %err, "error receiving request");
                let _ = outbound.send(Err(status.clone())).await;
                break SessionEnd::ReceiveFailed(status);
            }
            Some(Ok(req)) => req,
        };

        metrics.inc_requests(tenant_id);
        tracing::info!(%client_ip, %tenant_id, name = %req.name, "received request");

        let built = AssertUnwindSafe(builder.build_reply(ctx, &req))
            .catch_unwind()
            .await;
        let reply = match built {
            Ok(Ok(reply)) => reply,
            Ok(Err(status)) => {
                tracing::error!(%client_ip, %tenant_id, error = %status.message(), "error processing reply");
                let _ = outbound.send(Err(status.clone())).await;
                break SessionEnd::ReplyFailed(status);
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                tracing::error!(%client_ip, %tenant_id, panic = %msg, "reply builder panicked");
                let status = status_from_error(&TenantMuxError::Internal(msg));
                let _ = outbound.send(Err(status.clone())).await;
                break SessionEnd::ReplyFailed(status);
            }
        };

        if outbound.send(Ok(reply)).await.is_err() {
            tracing::error!(%client_ip, %tenant_id, "error sending reply: stream closed");
            break SessionEnd::Cancelled;
        }
        messages += 1;
    };

    tracing::debug!(%tenant_id, messages, ?end, "stream closed");
    drop(admitted);
    SessionSummary { messages, end }
}
