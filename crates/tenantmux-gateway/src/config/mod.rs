//! Tenant policy loader (strict parsing).
//!
//! The policy lives in `<config-dir>/tenant-config.yaml`. A missing or broken
//! file never stops the server: it falls back to the allow-all policy and
//! says so in the log.

pub mod schema;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tenantmux_core::error::{Result, TenantMuxError};
use tenantmux_core::policy::TenantPolicy;

pub use schema::{TenantConfig, TenantMatchSpec, TenantRangeSpec};

/// File name looked up inside the config directory.
pub const TENANT_CONFIG_FILE: &str = "tenant-config.yaml";

pub fn tenant_config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(TENANT_CONFIG_FILE)
}

/// Where the effective policy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    File,
    DefaultMissing,
    DefaultInvalid,
}

pub fn load_from_file(path: &Path) -> Result<TenantPolicy> {
    let s = fs::read_to_string(path)
        .map_err(|e| TenantMuxError::BadConfig(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<TenantPolicy> {
    let cfg: TenantConfig = serde_yaml::from_str(s)
        .map_err(|e| TenantMuxError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.into_policy()
}

/// Load the policy from `config_dir`, falling back to allow-all.
pub fn load_or_default(config_dir: &Path) -> (TenantPolicy, PolicySource) {
    let path = tenant_config_path(config_dir);
    match fs::read_to_string(&path) {
        Ok(s) => match load_from_str(&s) {
            Ok(p) => (p, PolicySource::File),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "unable to parse tenant config, accept all tenants");
                (TenantPolicy::default(), PolicySource::DefaultInvalid)
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "no tenant config, accept all tenants");
            (TenantPolicy::default(), PolicySource::DefaultMissing)
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "unable to load tenant config, accept all tenants");
            (TenantPolicy::default(), PolicySource::DefaultInvalid)
        }
    }
}
