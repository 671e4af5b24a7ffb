//! Top-level facade crate for tenantmux.
//!
//! Re-exports the policy engine and the gateway library so users can depend on a single crate.

pub mod core {
    pub use tenantmux_core::*;
}

pub mod gateway {
    pub use tenantmux_gateway::*;
}

pub use tenantmux_core::{TenantMatchRule, TenantPolicy, TenantRange};
pub use tenantmux_gateway::app_state::AppState;
pub use tenantmux_gateway::server::{Gateway, ServerOptions};
