//! tenantmux gateway library entry.
//!
//! Wires tenant identity, admission, per-tenant metrics, the greeter service
//! and the shared-port transport into one server. Consumed by the binaries
//! and by integration tests.

pub mod app_state;
pub mod cli;
pub mod config;
pub mod context;
pub mod environment;
pub mod interceptor;
pub mod obs;
pub mod ops;
pub mod router;
pub mod rpc;
pub mod server;
pub mod transport;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn setup_tracing(level: &str, format: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber.with(fmt::layer().json()).init(),
        _ => subscriber.with(fmt::layer()).init(),
    }
}
