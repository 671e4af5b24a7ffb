//! Per-tenant request counter and open-connection gauge.
//!
//! Series are keyed by tenant id and created lazily on first observation.
//! Each key owns its own atomic, so unrelated tenants never contend on one
//! lock; `DashMap` only shards the key lookup.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Label name used for every tenant series.
pub const TENANT_LABEL: &str = "tenantId";

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct TenantCounter {
    map: DashMap<String, AtomicU64>,
}

impl TenantCounter {
    pub fn inc(&self, tenant_id: &str) {
        // fast path: series already exists, no key allocation
        if let Some(c) = self.map.get(tenant_id) {
            c.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.map
            .entry(tenant_id.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, tenant_id: &str) -> u64 {
        self.map.get(tenant_id).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}=\"{}\"}} {}", name, TENANT_LABEL, escape_label(r.key()), val);
        }
    }
}

#[derive(Default)]
pub struct TenantGauge {
    map: DashMap<String, AtomicI64>,
}

impl TenantGauge {
    pub fn inc(&self, tenant_id: &str) { self.add(tenant_id, 1); }
    pub fn dec(&self, tenant_id: &str) { self.add(tenant_id, -1); }

    fn add(&self, tenant_id: &str, v: i64) {
        if let Some(g) = self.map.get(tenant_id) {
            g.fetch_add(v, Ordering::Relaxed);
            return;
        }
        self.map
            .entry(tenant_id.to_string())
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, tenant_id: &str) -> i64 {
        self.map.get(tenant_id).map(|g| g.load(Ordering::Relaxed)).unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}=\"{}\"}} {}", name, TENANT_LABEL, escape_label(r.key()), val);
        }
    }
}

/// Process-wide tenant metrics. Construct once, share via `Arc`.
#[derive(Default)]
pub struct TenantMetrics {
    requests: TenantCounter,
    open_connections: TenantGauge,
}

impl TenantMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_requests(&self, tenant_id: &str) {
        self.requests.inc(tenant_id);
    }

    pub fn inc_connections(&self, tenant_id: &str) {
        self.open_connections.inc(tenant_id);
    }

    pub fn dec_connections(&self, tenant_id: &str) {
        self.open_connections.dec(tenant_id);
    }

    pub fn request_count(&self, tenant_id: &str) -> u64 {
        self.requests.get(tenant_id)
    }

    pub fn open_connections(&self, tenant_id: &str) -> i64 {
        self.open_connections.get(tenant_id)
    }

    /// Increment the tenant's gauge now and decrement it when the guard drops.
    pub fn open_connection(self: &Arc<Self>, tenant_id: &str) -> ConnectionGuard {
        self.inc_connections(tenant_id);
        ConnectionGuard {
            metrics: Arc::clone(self),
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Render both series in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.requests.render("requests", &mut out);
        self.open_connections.render("open_connections", &mut out);
        out
    }
}

/// Holds one unit of a tenant's `open_connections` gauge.
///
/// Dropping the guard releases it, which also covers early returns, panics
/// unwinding through the call and futures dropped on cancellation.
pub struct ConnectionGuard {
    metrics: Arc<TenantMetrics>,
    tenant_id: String,
}

impl ConnectionGuard {
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.metrics.dec_connections(&self.tenant_id);
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard").field("tenant_id", &self.tenant_id).finish()
    }
}
