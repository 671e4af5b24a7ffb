//! tenantmux core: transport-agnostic error types and the tenant policy engine.
//!
//! This crate carries no transport or runtime dependencies so the admission
//! rules can be evaluated and tested in isolation from the gateway.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here outside of tests.
//! All fallible paths must surface as `TenantMuxError`/`Result`.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod error;
pub mod policy;

/// Shared result type.
pub use error::{ClientCode, Result, TenantMuxError};
pub use policy::{Evaluation, TenantMatchRule, TenantPolicy, TenantRange};
