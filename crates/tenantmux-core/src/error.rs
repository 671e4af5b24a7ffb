//! Shared error type across tenantmux crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Required tenant metadata absent.
    MissingTenantHeader,
    /// Tenant present but not admitted by policy.
    TenantDenied,
    /// Stream read/write failure that was not a normal end-of-input.
    StreamTransport,
    /// Internal server error (including contained panics).
    Internal,
    /// Invalid configuration.
    BadConfig,
    /// Shared listener failed.
    ListenerFatal,
}

impl ClientCode {
    /// String representation used in error metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::MissingTenantHeader => "MISSING_TENANT_HEADER",
            ClientCode::TenantDenied => "TENANT_DENIED",
            ClientCode::StreamTransport => "STREAM_TRANSPORT",
            ClientCode::Internal => "INTERNAL",
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::ListenerFatal => "LISTENER_FATAL",
        }
    }

    /// Admission failures terminate the call as an invalid-argument class error.
    pub fn is_admission(self) -> bool {
        matches!(self, ClientCode::MissingTenantHeader | ClientCode::TenantDenied)
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TenantMuxError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum TenantMuxError {
    #[error("Missing X-Tenant-Id header")]
    MissingTenantHeader,
    #[error("Wrong Tenant-Id for instance")]
    TenantDenied { tenant_id: String },
    #[error("stream transport: {0}")]
    StreamTransport(String),
    #[error("internal: {0}")]
    Internal(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("listener failed: {0}")]
    ListenerFatal(String),
}

impl TenantMuxError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TenantMuxError::MissingTenantHeader => ClientCode::MissingTenantHeader,
            TenantMuxError::TenantDenied { .. } => ClientCode::TenantDenied,
            TenantMuxError::StreamTransport(_) => ClientCode::StreamTransport,
            TenantMuxError::Internal(_) => ClientCode::Internal,
            TenantMuxError::BadConfig(_) => ClientCode::BadConfig,
            TenantMuxError::ListenerFatal(_) => ClientCode::ListenerFatal,
        }
    }
}
