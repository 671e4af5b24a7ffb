//! Greeter client.
//!
//! Sends one unary `SayHello`, or with `--stream` a paced run of
//! `StreamingHello` requests, tagging every call with a tenant id.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::Rng;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::metadata::MetadataValue;
use tonic::Request;

use tenantmux_gateway::context::TENANT_HEADER;
use tenantmux_gateway::rpc::proto::greeter_client::GreeterClient;
use tenantmux_gateway::rpc::proto::{HelloReply, HelloRequest};
use tenantmux_gateway::setup_tracing;

#[derive(Parser, Debug)]
#[command(name = "greeter-client")]
#[command(version, about = "Call the greeter as a given tenant", long_about = None)]
struct Args {
    /// Server endpoint
    #[arg(long, default_value = "http://localhost:50051")]
    addr: String,

    /// Name to greet
    #[arg(long, default_value = "world")]
    name: String,

    /// Tenant id to send; a random one is generated when omitted
    #[arg(long)]
    tenant: Option<String>,

    /// Use the streaming rpc instead of the unary one
    #[arg(long)]
    stream: bool,

    /// Streaming only: number of requests, -1 for no limit
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    stream_count: i64,

    /// Streaming only: pause between requests in ms, -1 for random 0..3000
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    stream_interval_ms: i64,

    /// Unary deadline in ms
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_tracing(&args.log_level, None);

    let tenant = args
        .tenant
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let tenant_value: MetadataValue<_> = tenant
        .parse()
        .with_context(|| format!("tenant id {tenant:?} is not a valid header value"))?;

    tracing::info!(addr = %args.addr, name = %args.name, %tenant, "connecting");
    let mut client = GreeterClient::connect(args.addr.clone())
        .await
        .with_context(|| format!("did not connect to {}", args.addr))?;

    let hello = HelloRequest { name: args.name.clone() };

    if !args.stream {
        let mut req = Request::new(hello);
        req.set_timeout(Duration::from_millis(args.timeout_ms));
        req.metadata_mut().insert(TENANT_HEADER, tenant_value);
        let reply = client.say_hello(req).await.context("could not greet")?;
        print_reply(reply.get_ref());
        return Ok(());
    }

    let (tx, rx) = mpsc::channel::<HelloRequest>(1);
    let mut req = Request::new(ReceiverStream::new(rx));
    req.metadata_mut().insert(TENANT_HEADER, tenant_value);

    // the request stream stays open until the first message is queued
    tx.send(hello.clone())
        .await
        .context("request stream closed before the first message")?;
    let mut replies = client
        .streaming_hello(req)
        .await
        .context("could not start streaming rpc")?
        .into_inner();

    let mut sent = 1i64;
    loop {
        match replies.message().await {
            Ok(Some(reply)) => print_reply(&reply),
            Ok(None) => {
                tracing::info!("EOF received");
                break;
            }
            Err(status) => {
                tracing::error!(code = ?status.code(), error = %status.message(), "error receiving reply");
                break;
            }
        }

        if args.stream_count != -1 && sent >= args.stream_count {
            break;
        }

        let pause = next_interval(args.stream_interval_ms);
        tracing::info!(ms = pause.as_millis() as u64, "sleeping");
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }

        if let Err(e) = tx.send(hello.clone()).await {
            tracing::error!(error = %e, "error sending request");
            break;
        }
        sent += 1;
    }

    drop(tx);
    Ok(())
}

fn next_interval(configured_ms: i64) -> Duration {
    if configured_ms < 0 {
        Duration::from_millis(rand::thread_rng().gen_range(0..3000))
    } else {
        Duration::from_millis(configured_ms as u64)
    }
}

fn print_reply(reply: &HelloReply) {
    match serde_json::to_string(reply) {
        Ok(json) => tracing::info!(response = %json, "response"),
        Err(_) => tracing::info!(response = ?reply, "response"),
    }
}
