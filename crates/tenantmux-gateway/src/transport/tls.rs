//! Optional TLS for the gRPC side of the shared listener.
//!
//! The HTTP ops endpoints stay plaintext; a TLS ClientHello is classified as
//! RPC by the sniffer and terminated by tonic. When TLS is requested but the
//! certificate or key file is missing, the server falls back to plaintext
//! and logs which file it could not find.

use std::fs;
use std::path::{Path, PathBuf};

use tonic::transport::{Identity, ServerTlsConfig};

use tenantmux_core::error::{Result, TenantMuxError};

pub const DEFAULT_CERT_PATH: &str = "certs/tls.crt";
pub const DEFAULT_KEY_PATH: &str = "certs/tls.key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub enabled: bool,
    /// PEM certificate chain.
    pub cert_path: PathBuf,
    /// PEM private key.
    pub key_path: PathBuf,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_path: PathBuf::from(DEFAULT_CERT_PATH),
            key_path: PathBuf::from(DEFAULT_KEY_PATH),
        }
    }
}

impl TlsSettings {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// `Ok(None)` means plaintext: TLS is off, or a file is missing.
    ///
    /// A file that exists but cannot be read is a configuration error.
    pub fn server_config(&self) -> Result<Option<ServerTlsConfig>> {
        if !self.enabled {
            return Ok(None);
        }

        let mut usable = true;
        for path in [&self.cert_path, &self.key_path] {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "could not find TLS file, serving plaintext");
                usable = false;
            }
        }
        if !usable {
            return Ok(None);
        }

        let cert = read_pem(&self.cert_path)?;
        let key = read_pem(&self.key_path)?;
        tracing::info!(
            cert = %self.cert_path.display(),
            key = %self.key_path.display(),
            "TLS enabled"
        );
        Ok(Some(ServerTlsConfig::new().identity(Identity::from_pem(cert, key))))
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .map_err(|e| TenantMuxError::BadConfig(format!("read {} failed: {e}", path.display())))
}
