//! Read-only sweep for resources left behind after a teardown.
//!
//! Each resource category is queried independently; a failing query is
//! recorded against its category and never aborts the audit. Nothing found
//! here is ever deleted.

use crate::config::Config;
use crate::provisioner::Provisioner;
use crate::registry;
use crate::types::{Environment, ResourceKind};
use serde::Serialize;

pub const RETAINED_NOTE: &str = "retained by policy, manual action required";
pub const LEAK_NOTE: &str = "possible leak, verify before manual deletion";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanResource {
    pub kind: ResourceKind,
    pub name: String,
    pub note: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum CategoryResult {
    Clean,
    Found(Vec<OrphanResource>),
    QueryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub result: CategoryResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub environment: Environment,
    pub categories: Vec<CategoryReport>,
}

impl AuditReport {
    pub fn orphans(&self) -> impl Iterator<Item = &OrphanResource> {
        self.categories
            .iter()
            .filter_map(|c| match &c.result {
                CategoryResult::Found(found) => Some(found),
                _ => None,
            })
            .flatten()
    }

    pub fn failed_queries(&self) -> usize {
        self.categories
            .iter()
            .filter(|c| matches!(c.result, CategoryResult::QueryFailed(_)))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.categories
            .iter()
            .all(|c| c.result == CategoryResult::Clean)
    }
}

/// Sweep every [`ResourceKind`] for names carrying the environment's naming
/// tokens.
pub fn audit(config: &Config, provisioner: &dyn Provisioner, env: Environment) -> AuditReport {
    let mut categories = Vec::with_capacity(ResourceKind::all().len());

    for &kind in ResourceKind::all() {
        let result = match provisioner.list_resources(kind, &config.project) {
            Ok(names) => {
                let found: Vec<OrphanResource> = names
                    .into_iter()
                    .filter(|name| registry::matches_environment(name, &config.project, env))
                    .map(|name| OrphanResource {
                        kind,
                        name,
                        note: if kind.retained_by_policy() {
                            RETAINED_NOTE
                        } else {
                            LEAK_NOTE
                        },
                    })
                    .collect();
                if found.is_empty() {
                    CategoryResult::Clean
                } else {
                    for orphan in &found {
                        tracing::warn!(kind = %kind, name = %orphan.name, "{}", orphan.note);
                    }
                    CategoryResult::Found(found)
                }
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "audit query failed");
                CategoryResult::QueryFailed(e.to_string())
            }
        };
        categories.push(CategoryReport { kind, result });
    }

    AuditReport {
        environment: env,
        categories,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeProvisioner};

    #[test]
    fn isolates_failures_and_flags_retained_buckets() {
        let fake = FakeProvisioner::new()
            .fail_resources(ResourceKind::Cluster, "AccessDenied")
            .with_resources(
                ResourceKind::Bucket,
                &["acme-assets-dev-1a2b", "acme-assets-prod-9z8y"],
            );
        let config = Config::new("acme");

        let report = audit(&config, &fake, Environment::Dev);

        assert_eq!(report.categories.len(), 5);
        assert_eq!(report.failed_queries(), 1);
        let clean = report
            .categories
            .iter()
            .filter(|c| c.result == CategoryResult::Clean)
            .count();
        assert_eq!(clean, 3);

        let orphans: Vec<_> = report.orphans().collect();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].name, "acme-assets-dev-1a2b");
        assert_eq!(orphans[0].note, RETAINED_NOTE);

        assert!(fake
            .calls()
            .iter()
            .all(|c| matches!(c, Call::ListResources(_))));
        assert!(fake.deletes().is_empty());
    }

    #[test]
    fn other_projects_and_environments_are_ignored() {
        let fake = FakeProvisioner::new().with_resources(
            ResourceKind::LoadBalancer,
            &["acme-alb-prod", "acme-alb-dev", "acmecorp-alb-development"],
        );
        let report = audit(&Config::new("acme"), &fake, Environment::Prod);

        let names: Vec<_> = report.orphans().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["acme-alb-prod"]);
        assert_eq!(report.orphans().next().map(|o| o.note), Some(LEAK_NOTE));
    }

    #[test]
    fn prod_names_containing_dev_are_not_dev_orphans() {
        let fake = FakeProvisioner::new().with_resources(
            ResourceKind::LoadBalancer,
            &["acme-devportal-prod", "acme-alb-prod"],
        );
        let report = audit(&Config::new("acme"), &fake, Environment::Dev);

        assert!(report.is_clean());
        assert_eq!(report.orphans().count(), 0);
    }

    #[test]
    fn empty_account_is_clean() {
        let report = audit(&Config::new("acme"), &FakeProvisioner::new(), Environment::Dev);
        assert!(report.is_clean());
        assert_eq!(report.orphans().count(), 0);
    }
}
