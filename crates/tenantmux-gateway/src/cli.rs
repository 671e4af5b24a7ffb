//! Command-line interface for the gateway binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::environment::DEFAULT_METADATA_URL;
use crate::server::ServerOptions;
use crate::transport::tls::{TlsSettings, DEFAULT_CERT_PATH, DEFAULT_KEY_PATH};

/// Multi-tenant greeter: gRPC and HTTP health on one port.
#[derive(Parser, Debug)]
#[command(name = "tenantmux-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:50051", env = "TENANTMUX_LISTEN")]
    pub listen: SocketAddr,

    /// Directory holding tenant-config.yaml
    #[arg(long, default_value = "config/", env = "TENANTMUX_CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// File whose contents are reported as the service version
    #[arg(long, default_value = "version.txt", env = "TENANTMUX_VERSION_FILE")]
    pub version_file: PathBuf,

    /// Instance metadata server base URL
    #[arg(long, default_value = DEFAULT_METADATA_URL, env = "TENANTMUX_METADATA_URL")]
    pub metadata_url: String,

    /// Per-lookup metadata timeout in milliseconds
    #[arg(long, default_value_t = 500, env = "TENANTMUX_METADATA_TIMEOUT_MS")]
    pub metadata_timeout_ms: u64,

    /// Skip instance metadata lookups entirely
    #[arg(long, env = "TENANTMUX_NO_METADATA")]
    pub no_metadata: bool,

    /// How long a new connection may take to send its first bytes
    #[arg(long, default_value_t = 10_000, env = "TENANTMUX_SNIFF_TIMEOUT_MS")]
    pub sniff_timeout_ms: u64,

    /// Serve gRPC over TLS; falls back to plaintext when a file is missing
    #[arg(long, default_value_t = true, action = ArgAction::Set, env = "TENANTMUX_TLS")]
    pub tls: bool,

    /// TLS certificate (PEM)
    #[arg(long, default_value = DEFAULT_CERT_PATH, env = "TENANTMUX_TLS_CRT")]
    pub crt: PathBuf,

    /// TLS private key (PEM)
    #[arg(long, default_value = DEFAULT_KEY_PATH, env = "TENANTMUX_TLS_KEY")]
    pub key: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "TENANTMUX_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "TENANTMUX_LOG_FORMAT")]
    pub log_format: Option<String>,
}

impl Cli {
    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            listen: self.listen,
            sniff_timeout: Duration::from_millis(self.sniff_timeout_ms),
            tls: TlsSettings {
                enabled: self.tls,
                cert_path: self.crt.clone(),
                key_path: self.key.clone(),
            },
        }
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }
}
