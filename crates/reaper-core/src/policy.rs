//! Protection policy: catalog names that are never torn down. Names are
//! compared without regard to case.

use std::collections::BTreeSet;

use crate::error::{ReaperError, Result};
use crate::model::ResourceDescriptor;

/// Catalog names exempt from deletion, stored lowercase.
pub type ProtectionSet = BTreeSet<String>;

/// Platform-owned catalogs plus the shared dbt trial catalog.
pub const DEFAULT_PROTECTED_CATALOGS: &[&str] =
    &["main", "hive_metastore", "system", "samples", "trial_dbt"];

pub fn default_protection_set() -> ProtectionSet {
    DEFAULT_PROTECTED_CATALOGS
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct ProtectionPolicy {
    protected: ProtectionSet,
}

impl ProtectionPolicy {
    pub fn new(protected: ProtectionSet) -> Self {
        Self {
            protected: protected.iter().map(|name| normalize(name)).collect(),
        }
    }

    /// Unity Catalog resolves catalog names case-insensitively, so `MAIN`
    /// and `main` are the same catalog.
    pub fn is_protected(&self, catalog_name: &str) -> bool {
        self.protected.contains(&normalize(catalog_name))
    }

    /// Like [`vetoes`](Self::vetoes), reported as [`ReaperError::Protected`].
    pub fn check(&self, descriptor: &ResourceDescriptor) -> Result<()> {
        if self.vetoes(descriptor) {
            return Err(ReaperError::Protected {
                name: descriptor.identifier().to_string(),
            });
        }
        Ok(())
    }

    /// Only catalogs are subject to the policy; warehouses carry no data.
    pub fn vetoes(&self, descriptor: &ResourceDescriptor) -> bool {
        match descriptor {
            ResourceDescriptor::Catalog { name } => self.is_protected(name),
            ResourceDescriptor::Warehouse { .. } => false,
        }
    }

    pub fn protected_names(&self) -> impl Iterator<Item = &str> {
        self.protected.iter().map(String::as_str)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Default for ProtectionPolicy {
    fn default() -> Self {
        Self::new(default_protection_set())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_protect_shared_catalogs() {
        let policy = ProtectionPolicy::default();
        for name in DEFAULT_PROTECTED_CATALOGS {
            assert!(policy.is_protected(name), "{name} should be protected");
        }
        assert!(!policy.is_protected("sandbox_pr_7_tmp"));
    }

    #[test]
    fn match_ignores_case_only() {
        let policy = ProtectionPolicy::new(["Trial_DBT".to_string()].into_iter().collect());
        assert!(policy.is_protected("trial_dbt"));
        assert!(policy.is_protected("TRIAL_DBT"));
        assert!(ProtectionPolicy::default().is_protected("MAIN"));
        assert!(!policy.is_protected("trial_dbt_copy"));
        assert!(!policy.is_protected(""));
        assert_eq!(policy.protected_names().collect::<Vec<_>>(), vec!["trial_dbt"]);
    }

    #[test]
    fn check_reports_protected_catalog() {
        let policy = ProtectionPolicy::default();
        let err = policy
            .check(&ResourceDescriptor::Catalog { name: "Samples".into() })
            .unwrap_err();
        assert!(matches!(err, ReaperError::Protected { ref name } if name == "Samples"));
        assert!(
            policy
                .check(&ResourceDescriptor::Catalog { name: "sandbox_pr_1".into() })
                .is_ok()
        );
    }

    #[test]
    fn warehouses_are_never_vetoed() {
        let policy = ProtectionPolicy::new(["wh-1".to_string()].into_iter().collect());
        assert!(!policy.vetoes(&ResourceDescriptor::Warehouse { id: "wh-1".into() }));
        assert!(policy.vetoes(&ResourceDescriptor::Catalog {
            name: "wh-1".into()
        }));
    }
}
