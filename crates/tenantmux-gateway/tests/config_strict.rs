#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use tenantmux_core::policy::{TenantMatchRule, TenantPolicy, TenantRange};
use tenantmux_gateway::config::{self, PolicySource};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
allowed_tenants:
  - exact: ["tenant-a"]
    prefx: ["team-"] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_CONFIG");
}

#[test]
fn deny_unknown_top_level_field() {
    let bad = r#"
allowed_tenants: []
allow_tenants: []
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn entry_with_two_kinds_is_rejected() {
    let bad = r#"
allowed_tenants:
  - exact: ["tenant-a"]
    prefix: ["team-"]
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("allowed_tenants[0]"), "{err}");
}

#[test]
fn empty_entry_is_rejected() {
    let bad = r#"
denied_tenants:
  - {}
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("denied_tenants[0]"), "{err}");
}

#[test]
fn ok_full_config() {
    let ok = r#"
allowed_tenants:
  - exactMatch: ["tenant-a", "tenant-c"]
  - prefix: ["team-"]
  - range:
      - start: "0000"
        end: "4999"
denied_tenants:
  - exact: ["team-blocked"]
"#;
    let policy = config::load_from_str(ok).expect("must parse");
    assert_eq!(
        policy,
        TenantPolicy::new(
            vec![
                TenantMatchRule::Exact(vec!["tenant-a".into(), "tenant-c".into()]),
                TenantMatchRule::Prefix(vec!["team-".into()]),
                TenantMatchRule::Range(vec![TenantRange::new("0000", "4999")]),
            ],
            vec![TenantMatchRule::Exact(vec!["team-blocked".into()])],
        )
    );
    assert!(policy.admit("tenant-c"));
    assert!(policy.admit("team-x"));
    assert!(policy.admit("0420"));
    assert!(!policy.admit("tenant-b"));
}

#[test]
fn missing_lists_default_to_empty() {
    let policy = config::load_from_str("allowed_tenants: []\n").expect("must parse");
    assert!(policy.allowed.is_empty());
    assert!(policy.denied.is_empty());
    assert!(!policy.admit("anyone"));
}

#[test]
fn missing_file_falls_back_to_allow_all() {
    let dir = tempfile::tempdir().unwrap();
    let (policy, source) = config::load_or_default(dir.path());
    assert_eq!(source, PolicySource::DefaultMissing);
    assert_eq!(policy, TenantPolicy::allow_all());
    assert!(policy.admit("whoever"));
}

#[test]
fn invalid_file_falls_back_to_allow_all() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(config::tenant_config_path(dir.path()), "allowed_tenants: [[[").unwrap();
    let (policy, source) = config::load_or_default(dir.path());
    assert_eq!(source, PolicySource::DefaultInvalid);
    assert_eq!(policy, TenantPolicy::allow_all());
}

#[test]
fn file_on_disk_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        config::tenant_config_path(dir.path()),
        "allowed_tenants:\n  - exact: [\"tenant-a\"]\n",
    )
    .unwrap();
    let (policy, source) = config::load_or_default(dir.path());
    assert_eq!(source, PolicySource::File);
    assert!(policy.admit("tenant-a"));
    assert!(!policy.admit("tenant-b"));
}
