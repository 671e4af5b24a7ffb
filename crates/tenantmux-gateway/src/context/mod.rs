//! Call-scoped tenant context.
//!
//! Identity is pulled from call metadata once, so admission, metrics and
//! logging all see the same tenant key.

pub mod tenant;

pub use tenant::{extract_tenant_id, CallMeta, TenantContext, TENANT_HEADER};
