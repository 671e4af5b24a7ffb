//! `helloworld.Greeter` implementation.
//!
//! Both methods go through the [`InterceptorChain`]: the unary call end to
//! end, the stream for its one-time admission before the session loop takes
//! over.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};

use crate::context::CallMeta;
use crate::interceptor::{status_from_error, InterceptorChain};
use crate::rpc::proto::greeter_server::Greeter;
use crate::rpc::proto::{HelloReply, HelloRequest};
use crate::rpc::reply::ReplyBuilder;
use crate::rpc::session::run_session;

pub const SAY_HELLO: &str = "/helloworld.Greeter/SayHello";
pub const STREAMING_HELLO: &str = "/helloworld.Greeter/StreamingHello";

/// Outbound replies buffered per stream before the session loop waits.
const STREAM_BUFFER: usize = 16;

pub struct GreeterService {
    chain: InterceptorChain,
    builder: Arc<dyn ReplyBuilder>,
}

impl GreeterService {
    pub fn new(chain: InterceptorChain, builder: Arc<dyn ReplyBuilder>) -> Self {
        Self { chain, builder }
    }
}

#[tonic::async_trait]
impl Greeter for GreeterService {
    async fn say_hello(&self, request: Request<HelloRequest>) -> Result<Response<HelloReply>, Status> {
        let call = CallMeta::new(SAY_HELLO, request.remote_addr());
        let builder = Arc::clone(&self.builder);
        self.chain
            .unary(call, request, |ctx, req| async move {
                tracing::info!(client_ip = %ctx.client_ip(), tenant_id = %ctx.tenant_id, name = %req.name, "received request");
                builder.build_reply(&ctx, &req).await
            })
            .await
    }

    type StreamingHelloStream = ReceiverStream<Result<HelloReply, Status>>;

    async fn streaming_hello(
        &self,
        request: Request<Streaming<HelloRequest>>,
    ) -> Result<Response<Self::StreamingHelloStream>, Status> {
        let call = CallMeta::new(STREAMING_HELLO, request.remote_addr());
        let admitted = self
            .chain
            .admit(request.metadata(), call)
            .map_err(|e| status_from_error(&e))?;

        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let builder = Arc::clone(&self.builder);
        let metrics = Arc::clone(self.chain.metrics());

        tokio::spawn(async move {
            let summary = run_session(admitted, inbound, tx, builder, metrics).await;
            if summary.end.is_error() {
                tracing::warn!(messages = summary.messages, end = ?summary.end, "stream ended with error");
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
