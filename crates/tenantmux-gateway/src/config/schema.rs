use serde::Deserialize;
use tenantmux_core::error::{Result, TenantMuxError};
use tenantmux_core::policy::{TenantMatchRule, TenantPolicy, TenantRange};

/// On-disk shape of `tenant-config.yaml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    #[serde(default)]
    pub allowed_tenants: Vec<TenantMatchSpec>,

    #[serde(default)]
    pub denied_tenants: Vec<TenantMatchSpec>,
}

impl TenantConfig {
    pub fn validate(&self) -> Result<()> {
        for (i, m) in self.allowed_tenants.iter().enumerate() {
            m.validate().map_err(|e| at("allowed_tenants", i, e))?;
        }
        for (i, m) in self.denied_tenants.iter().enumerate() {
            m.validate().map_err(|e| at("denied_tenants", i, e))?;
        }
        Ok(())
    }

    /// Compile into the immutable runtime policy.
    pub fn into_policy(self) -> Result<TenantPolicy> {
        self.validate()?;
        let allowed = self
            .allowed_tenants
            .into_iter()
            .map(TenantMatchSpec::into_rule)
            .collect::<Result<Vec<_>>>()?;
        let denied = self
            .denied_tenants
            .into_iter()
            .map(TenantMatchSpec::into_rule)
            .collect::<Result<Vec<_>>>()?;
        Ok(TenantPolicy::new(allowed, denied))
    }
}

fn at(list: &str, idx: usize, e: TenantMuxError) -> TenantMuxError {
    TenantMuxError::BadConfig(format!("{list}[{idx}]: {e}"))
}

/// One list entry. Exactly one of the three keys must be set.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantMatchSpec {
    #[serde(default, alias = "exactMatch")]
    pub exact: Option<Vec<String>>,

    #[serde(default)]
    pub prefix: Option<Vec<String>>,

    #[serde(default)]
    pub range: Option<Vec<TenantRangeSpec>>,
}

impl TenantMatchSpec {
    pub fn validate(&self) -> Result<()> {
        let populated = [self.exact.is_some(), self.prefix.is_some(), self.range.is_some()]
            .iter()
            .filter(|b| **b)
            .count();
        match populated {
            1 => Ok(()),
            0 => Err(TenantMuxError::BadConfig(
                "rule must set one of exact, prefix, range".into(),
            )),
            _ => Err(TenantMuxError::BadConfig(
                "rule must set only one of exact, prefix, range".into(),
            )),
        }
    }

    fn into_rule(self) -> Result<TenantMatchRule> {
        match (self.exact, self.prefix, self.range) {
            (Some(v), None, None) => Ok(TenantMatchRule::Exact(v)),
            (None, Some(v), None) => Ok(TenantMatchRule::Prefix(v)),
            (None, None, Some(v)) => Ok(TenantMatchRule::Range(
                v.into_iter().map(|r| TenantRange::new(r.start, r.end)).collect(),
            )),
            _ => Err(TenantMuxError::BadConfig("ambiguous tenant rule".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantRangeSpec {
    pub start: String,
    pub end: String,
}
