//! tenantmux gateway
//!
//! One port, two protocols:
//! - gRPC `helloworld.Greeter` (tenant-screened) and `grpc.health.v1.Health`
//! - HTTP/1.1 `/healthz` and `/metrics`

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use tenantmux_gateway::{
    app_state::AppState,
    cli::Cli,
    config,
    environment::{CloudMetadata, EnvironmentProbe, MetadataSource, NoMetadata},
    rpc::GreetingBuilder,
    server::Gateway,
    setup_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(&cli.log_level, cli.log_format.as_deref());

    let (policy, source) = config::load_or_default(&cli.config_dir);
    match serde_json::to_string(&policy) {
        Ok(json) => tracing::info!(policy = %json, ?source, "loaded tenant policy"),
        Err(e) => tracing::warn!(error = %e, "unable to render tenant policy"),
    }

    let metadata: Arc<dyn MetadataSource> = if cli.no_metadata {
        Arc::new(NoMetadata)
    } else {
        Arc::new(
            CloudMetadata::new(cli.metadata_url.clone(), cli.metadata_timeout())
                .context("failed to build metadata client")?,
        )
    };
    let env = Arc::new(EnvironmentProbe::new(metadata, cli.version_file.clone()));
    let state = AppState::new(policy, Arc::new(GreetingBuilder::new(env)));

    let gateway = Gateway::bind(state, &cli.server_options())
        .await
        .context("failed to bind listener")?;
    let addr = gateway.local_addr()?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "tenantmux-gateway starting");

    gateway
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "unable to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("tenantmux-gateway stopped");
    Ok(())
}
