use std::net::SocketAddr;

use tonic::metadata::MetadataMap;

use tenantmux_core::error::{Result, TenantMuxError};

/// Metadata key carrying the caller's tenant identifier.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Returns the first `x-tenant-id` value.
///
/// The identifier is trusted as-is: any bytes the transport accepted are
/// kept, with invalid UTF-8 replaced. Only an absent or empty value counts
/// as missing.
pub fn extract_tenant_id(md: &MetadataMap) -> Result<String> {
    let value = md.get(TENANT_HEADER).ok_or(TenantMuxError::MissingTenantHeader)?;
    let tenant_id = String::from_utf8_lossy(value.as_bytes());
    if tenant_id.is_empty() {
        return Err(TenantMuxError::MissingTenantHeader);
    }
    Ok(tenant_id.into_owned())
}

/// Static facts about a call, known before admission.
#[derive(Debug, Clone)]
pub struct CallMeta {
    /// Full gRPC method path, e.g. `/helloworld.Greeter/SayHello`.
    pub method: &'static str,
    /// Remote peer, if the transport knows it.
    pub peer: Option<SocketAddr>,
}

impl CallMeta {
    pub fn new(method: &'static str, peer: Option<SocketAddr>) -> Self {
        Self { method, peer }
    }

    /// Peer address for logs.
    pub fn client_ip(&self) -> String {
        self.peer.map(|p| p.to_string()).unwrap_or_else(|| "unknown".into())
    }
}

/// Admitted tenant plus the call it belongs to.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: String,
    pub call: CallMeta,
}

impl TenantContext {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
    pub fn client_ip(&self) -> String {
        self.call.client_ip()
    }
}
