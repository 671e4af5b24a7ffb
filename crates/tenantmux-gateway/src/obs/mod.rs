//! In-process tenant metrics.
//!
//! Counters and gauges are stored as atomics keyed by tenant and rendered in
//! Prometheus text format by the `/metrics` handler.

pub mod metrics;

pub use metrics::{ConnectionGuard, TenantMetrics};
