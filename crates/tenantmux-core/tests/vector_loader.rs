//! JSON policy vector loader shared by the policy tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde::Deserialize;
use tenantmux_core::{TenantMatchRule, TenantPolicy, TenantRange};

#[derive(Debug, Deserialize)]
pub struct PolicyVector {
    pub description: String,
    pub policy: PolicyData,
    pub cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyData {
    #[serde(default)]
    pub allowed: Vec<RuleData>,
    #[serde(default)]
    pub denied: Vec<RuleData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleData {
    Exact(Vec<String>),
    Prefix(Vec<String>),
    Range(Vec<(String, String)>),
}

#[derive(Debug, Deserialize)]
pub struct Case {
    pub tenant: String,
    pub admit: bool,
}

impl RuleData {
    fn to_rule(&self) -> TenantMatchRule {
        match self {
            RuleData::Exact(v) => TenantMatchRule::Exact(v.clone()),
            RuleData::Prefix(v) => TenantMatchRule::Prefix(v.clone()),
            RuleData::Range(v) => TenantMatchRule::Range(
                v.iter().map(|(s, e)| TenantRange::new(s.as_str(), e.as_str())).collect(),
            ),
        }
    }
}

impl PolicyData {
    pub fn to_policy(&self) -> TenantPolicy {
        TenantPolicy::new(
            self.allowed.iter().map(RuleData::to_rule).collect(),
            self.denied.iter().map(RuleData::to_rule).collect(),
        )
    }
}

pub fn load(name: &str) -> PolicyVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
