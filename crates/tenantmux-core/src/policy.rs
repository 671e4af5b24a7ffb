//! Tenant admission policy.
//!
//! A policy is two ordered rule lists. Evaluation is pure and lock-free so a
//! single `Arc<TenantPolicy>` can be shared by every in-flight call.
//!
//! Deny rules are scanned first, but a deny match only ends the deny scan:
//! admission is decided by the allow list alone. Callers that care about the
//! deny hit can observe it through [`TenantPolicy::evaluate`].

use serde::Serialize;

/// Literal in an exact rule that matches every tenant.
pub const WILDCARD: &str = "*";

/// Inclusive lexicographic interval `start <= tenant_id <= end`.
///
/// Comparison is byte-wise string ordering, not numeric. Fixed-width
/// identifiers must be zero padded for numeric-looking ranges to work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantRange {
    pub start: String,
    pub end: String,
}

impl TenantRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self { start: start.into(), end: end.into() }
    }

    pub fn contains(&self, tenant_id: &str) -> bool {
        self.start.as_str() <= tenant_id && tenant_id <= self.end.as_str()
    }
}

/// One match rule. Exactly one kind per rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantMatchRule {
    Exact(Vec<String>),
    Prefix(Vec<String>),
    Range(Vec<TenantRange>),
}

impl TenantMatchRule {
    pub fn matches(&self, tenant_id: &str) -> bool {
        match self {
            TenantMatchRule::Exact(literals) => literals
                .iter()
                .any(|t| t == WILDCARD || t == tenant_id),
            TenantMatchRule::Prefix(prefixes) => {
                prefixes.iter().any(|p| tenant_id.starts_with(p.as_str()))
            }
            TenantMatchRule::Range(ranges) => ranges.iter().any(|r| r.contains(tenant_id)),
        }
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub admitted: bool,
    /// A deny rule matched. Does not affect `admitted`.
    pub deny_matched: bool,
}

/// Immutable tenant policy, loaded once per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantPolicy {
    pub allowed: Vec<TenantMatchRule>,
    pub denied: Vec<TenantMatchRule>,
}

impl Default for TenantPolicy {
    /// Allow every tenant, deny none.
    fn default() -> Self {
        Self::allow_all()
    }
}

impl TenantPolicy {
    pub fn new(allowed: Vec<TenantMatchRule>, denied: Vec<TenantMatchRule>) -> Self {
        Self { allowed, denied }
    }

    pub fn allow_all() -> Self {
        Self {
            allowed: vec![TenantMatchRule::Exact(vec![WILDCARD.to_string()])],
            denied: Vec::new(),
        }
    }

    /// Returns true iff the tenant matches at least one allow rule.
    pub fn admit(&self, tenant_id: &str) -> bool {
        self.evaluate(tenant_id).admitted
    }

    pub fn evaluate(&self, tenant_id: &str) -> Evaluation {
        // first deny hit stops the deny scan; the allow list still decides
        let deny_matched = self.denied.iter().any(|rule| rule.matches(tenant_id));
        let admitted = self.allowed.iter().any(|rule| rule.matches(tenant_id));
        Evaluation { admitted, deny_matched }
    }
}
