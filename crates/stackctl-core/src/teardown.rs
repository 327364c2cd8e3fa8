//! Ordered, guarded deletion of an environment's stacks.
//!
//! Deletion runs database, compute, network. A stack is refused while a
//! stack that hard-depends on it still exists. Production database and
//! whole-environment deletions pass through the [`Confirm`] gate before any
//! remote call is made.
//!
//! The network stack is the one that fails to delete in practice: ENIs left
//! by load balancers, VPC endpoints and route table associations hold the
//! VPC. Each network attempt therefore releases those first and the whole
//! cycle is retried with a fixed back-off when the service reports
//! `DELETE_FAILED`.

use crate::audit::{self, AuditReport};
use crate::config::Config;
use crate::confirm::{confirm_delete, Confirm, DeleteTarget};
use crate::error::{Result, StackError};
use crate::poller::{wait_for_terminal, PollOutcome, Sleeper, WaitGoal};
use crate::provisioner::Provisioner;
use crate::registry::{self, DEPLOY_ORDER, TEARDOWN_ORDER, VPC_ID_OUTPUT};
use crate::types::{DanglingKind, Environment, StackInstance, StackKind, StackStatus};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// No stack existed; nothing was called.
    Absent,
    Deleted { attempts: u32 },
    /// The wait ran out; deletion may still complete on its own.
    TimedOut { attempts: u32, last: StackStatus },
}

#[derive(Debug, Clone, Serialize)]
pub struct StackDeletion {
    pub kind: StackKind,
    pub stack: String,
    #[serde(flatten)]
    pub outcome: DeleteOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeardownReport {
    pub environment: Environment,
    pub stacks: Vec<StackDeletion>,
    pub audit: AuditReport,
}

impl TeardownReport {
    pub fn timed_out(&self) -> impl Iterator<Item = &StackDeletion> {
        self.stacks
            .iter()
            .filter(|s| matches!(s.outcome, DeleteOutcome::TimedOut { .. }))
    }
}

pub struct Teardown<'a> {
    config: &'a Config,
    provisioner: &'a dyn Provisioner,
    sleeper: &'a dyn Sleeper,
    confirm: &'a dyn Confirm,
}

impl<'a> Teardown<'a> {
    pub fn new(
        config: &'a Config,
        provisioner: &'a dyn Provisioner,
        sleeper: &'a dyn Sleeper,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            config,
            provisioner,
            sleeper,
            confirm,
        }
    }

    /// Stacks that currently exist in `env`, in deployment order.
    pub fn list_stacks(&self, env: Environment) -> Result<Vec<StackInstance>> {
        let mut stacks = Vec::new();
        for kind in DEPLOY_ORDER {
            let name = self.stack_name(kind, env);
            if let Some(record) = self.provisioner.describe_stack(&name)? {
                stacks.push(record.into_instance(kind, env));
            }
        }
        Ok(stacks)
    }

    pub fn delete_one(&self, env: Environment, kind: StackKind) -> Result<DeleteOutcome> {
        confirm_delete(
            self.confirm,
            env,
            DeleteTarget::Stack(kind),
            &self.config.project,
        )?;
        self.delete_kind(env, kind)
    }

    /// Delete every stack in teardown order, then audit for leftovers.
    ///
    /// A timed-out deletion is reported and the sequence moves on; any error
    /// stops it.
    pub fn delete_all(&self, env: Environment) -> Result<TeardownReport> {
        confirm_delete(self.confirm, env, DeleteTarget::All, &self.config.project)?;

        let mut stacks = Vec::with_capacity(TEARDOWN_ORDER.len());
        for kind in TEARDOWN_ORDER {
            let outcome = self.delete_kind(env, kind)?;
            if let DeleteOutcome::TimedOut { last, .. } = outcome {
                tracing::warn!(
                    stack = %self.stack_name(kind, env),
                    %last,
                    "deletion still running after the wait limit; continuing"
                );
            }
            stacks.push(StackDeletion {
                kind,
                stack: self.stack_name(kind, env),
                outcome,
            });
        }

        let audit = audit::audit(self.config, self.provisioner, env);
        Ok(TeardownReport {
            environment: env,
            stacks,
            audit,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn stack_name(&self, kind: StackKind, env: Environment) -> String {
        registry::stack_name(&self.config.project, kind, env)
    }

    fn delete_kind(&self, env: Environment, kind: StackKind) -> Result<DeleteOutcome> {
        let name = self.stack_name(kind, env);

        let mut blocking = Vec::new();
        for dependent in registry::dependents(kind) {
            let dependent_name = self.stack_name(dependent, env);
            if self.provisioner.describe_status(&dependent_name)?.exists() {
                blocking.push(dependent_name);
            }
        }
        if !blocking.is_empty() {
            return Err(StackError::DependencyViolation {
                stack: name,
                blocking,
            });
        }
        for dependent in registry::soft_dependents(kind) {
            let dependent_name = self.stack_name(dependent, env);
            if self.provisioner.describe_status(&dependent_name)?.exists() {
                tracing::warn!(
                    stack = %name,
                    dependent = %dependent_name,
                    "dependent stack still references this stack's outputs"
                );
            }
        }

        if !self.provisioner.describe_status(&name)?.exists() {
            tracing::info!(stack = %name, "stack does not exist; nothing to delete");
            return Ok(DeleteOutcome::Absent);
        }

        match kind {
            StackKind::Network => self.delete_network(&name),
            StackKind::Compute | StackKind::Database => self.delete_simple(&name),
        }
    }

    fn delete_simple(&self, name: &str) -> Result<DeleteOutcome> {
        tracing::info!(stack = %name, "deleting stack");
        self.provisioner.delete(name)?;
        match self.wait_deleted(name)? {
            PollOutcome::Done { .. } => {
                tracing::info!(stack = %name, "stack deleted");
                Ok(DeleteOutcome::Deleted { attempts: 1 })
            }
            PollOutcome::Failed { status, .. } => Err(StackError::Provisioning {
                stack: name.to_string(),
                detail: format!("deletion ended in {status}"),
            }),
            PollOutcome::TimedOut { last, .. } => Ok(DeleteOutcome::TimedOut { attempts: 1, last }),
        }
    }

    fn delete_network(&self, name: &str) -> Result<DeleteOutcome> {
        let retry = self.config.retry_policy();
        let max_attempts = retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.pre_cleanup(name);
            tracing::info!(stack = %name, attempt, max_attempts, "deleting network stack");
            self.provisioner.delete(name)?;

            match self.wait_deleted(name)? {
                PollOutcome::Done { .. } => {
                    tracing::info!(stack = %name, attempt, "network stack deleted");
                    return Ok(DeleteOutcome::Deleted { attempts: attempt });
                }
                PollOutcome::TimedOut { last, .. } => {
                    return Ok(DeleteOutcome::TimedOut {
                        attempts: attempt,
                        last,
                    });
                }
                PollOutcome::Failed { status, .. } => {
                    tracing::warn!(stack = %name, attempt, %status, "network deletion failed");
                    if attempt < max_attempts {
                        self.sleeper.sleep(retry.backoff);
                    }
                }
            }
        }

        Err(StackError::RetriesExhausted {
            stack: name.to_string(),
            attempts: max_attempts,
        })
    }

    /// Release attachments that keep the VPC alive. Every failure here is
    /// logged and skipped.
    fn pre_cleanup(&self, name: &str) {
        let vpc_id = match self.provisioner.list_outputs(name) {
            Ok(outputs) => outputs
                .into_iter()
                .find(|(k, _)| k == VPC_ID_OUTPUT)
                .map(|(_, v)| v),
            Err(e) => {
                tracing::warn!(stack = %name, error = %e, "could not read network outputs");
                None
            }
        };
        let Some(vpc_id) = vpc_id else {
            tracing::warn!(stack = %name, "VPC id unknown; skipping pre-cleanup");
            return;
        };

        for &kind in DanglingKind::all() {
            let ids = match self.provisioner.list_dangling(&vpc_id, kind) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(vpc = %vpc_id, %kind, error = %e, "listing failed");
                    continue;
                }
            };
            for id in ids {
                match self.provisioner.release_dangling(kind, &id) {
                    Ok(()) => tracing::info!(vpc = %vpc_id, %kind, %id, "released"),
                    Err(e) => {
                        tracing::warn!(vpc = %vpc_id, %kind, %id, error = %e, "release failed")
                    }
                }
            }
        }
    }

    fn wait_deleted(&self, name: &str) -> Result<PollOutcome> {
        wait_for_terminal(
            self.provisioner,
            self.sleeper,
            name,
            WaitGoal::Deleted,
            &self.config.poll_policy(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RETAINED_NOTE;
    use crate::confirm::Preset;
    use crate::fake::{Call, FakeProvisioner, RecordingSleeper};
    use crate::types::ResourceKind;
    use std::cell::Cell;
    use StackStatus::*;

    const NET: &str = "acme-network-dev";
    const APP: &str = "acme-compute-dev";
    const DB: &str = "acme-database-dev";

    fn config() -> Config {
        Config::new("acme")
    }

    fn full_env() -> FakeProvisioner {
        FakeProvisioner::new()
            .with_stack(NET, Complete, &[("VpcId", "vpc-0abc")])
            .with_stack(APP, Complete, &[])
            .with_stack(DB, Complete, &[])
    }

    fn no_confirm() -> Preset {
        Preset(None)
    }

    struct CountingConfirm {
        answer: &'static str,
        asked: Cell<u32>,
    }

    impl Confirm for CountingConfirm {
        fn ask(&self, _prompt: &str) -> Result<Option<String>> {
            self.asked.set(self.asked.get() + 1);
            Ok(Some(self.answer.to_string()))
        }
    }

    #[test]
    fn network_blocked_while_dependents_exist() {
        let fake = FakeProvisioner::new()
            .with_stack(NET, Complete, &[("VpcId", "vpc-0abc")])
            .with_stack(APP, Complete, &[]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let err = teardown
            .delete_one(Environment::Dev, StackKind::Network)
            .unwrap_err();

        match err {
            StackError::DependencyViolation { stack, blocking } => {
                assert_eq!(stack, NET);
                assert_eq!(blocking, vec![APP.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fake.deletes().is_empty());
    }

    #[test]
    fn prod_network_blocked_by_both_dependents() {
        let fake = FakeProvisioner::new()
            .with_stack("acme-network-prod", Complete, &[("VpcId", "vpc-0def")])
            .with_stack("acme-compute-prod", Complete, &[])
            .with_stack("acme-database-prod", Complete, &[]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let err = teardown
            .delete_one(Environment::Prod, StackKind::Network)
            .unwrap_err();

        match err {
            StackError::DependencyViolation { stack, blocking } => {
                assert_eq!(stack, "acme-network-prod");
                assert_eq!(blocking, vec!["acme-compute-prod", "acme-database-prod"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fake.deletes().is_empty());
        assert!(fake.releases().is_empty());
    }

    #[test]
    fn network_deletes_once_dependents_are_gone() {
        let fake = FakeProvisioner::new().with_stack(NET, Complete, &[("VpcId", "vpc-0abc")]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let outcome = teardown
            .delete_one(Environment::Dev, StackKind::Network)
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 1 });
        assert_eq!(fake.deletes(), vec![NET.to_string()]);
    }

    #[test]
    fn compute_deletes_even_with_database_present() {
        let fake = full_env();
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let outcome = teardown
            .delete_one(Environment::Dev, StackKind::Compute)
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 1 });
        assert_eq!(fake.deletes(), vec![APP.to_string()]);
        assert_eq!(fake.status_of(DB), Complete);
    }

    #[test]
    fn delete_all_runs_database_compute_network() {
        let fake = full_env();
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let report = teardown.delete_all(Environment::Dev).unwrap();

        assert_eq!(
            fake.deletes(),
            vec![DB.to_string(), APP.to_string(), NET.to_string()]
        );
        let kinds: Vec<_> = report.stacks.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, TEARDOWN_ORDER.to_vec());
        assert!(report
            .stacks
            .iter()
            .all(|s| s.outcome == DeleteOutcome::Deleted { attempts: 1 }));
        assert_eq!(report.audit.categories.len(), ResourceKind::all().len());
    }

    #[test]
    fn absent_stack_is_a_no_op() {
        let fake = FakeProvisioner::new();
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let outcome = teardown
            .delete_one(Environment::Dev, StackKind::Database)
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Absent);
        assert!(fake.deletes().is_empty());
    }

    #[test]
    fn prod_database_wrong_token_makes_no_calls() {
        let fake = FakeProvisioner::new().with_stack("acme-database-prod", Complete, &[]);
        let (cfg, sleeper) = (config(), RecordingSleeper::default());
        let confirm = Preset(Some("delete-prod".to_string()));
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let err = teardown
            .delete_one(Environment::Prod, StackKind::Database)
            .unwrap_err();

        assert!(matches!(err, StackError::ConfirmationDeclined { .. }));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn prod_database_exact_token_proceeds() {
        let fake = FakeProvisioner::new().with_stack("acme-database-prod", Complete, &[]);
        let (cfg, sleeper) = (config(), RecordingSleeper::default());
        let confirm = Preset(Some("DELETE-PROD".to_string()));
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        teardown
            .delete_one(Environment::Prod, StackKind::Database)
            .unwrap();

        assert_eq!(fake.deletes(), vec!["acme-database-prod".to_string()]);
    }

    #[test]
    fn prod_all_asks_exactly_once() {
        let fake = FakeProvisioner::new()
            .with_stack("acme-network-prod", Complete, &[])
            .with_stack("acme-compute-prod", Complete, &[])
            .with_stack("acme-database-prod", Complete, &[]);
        let (cfg, sleeper) = (config(), RecordingSleeper::default());
        let confirm = CountingConfirm {
            answer: "DELETE-ALL-PROD",
            asked: Cell::new(0),
        };
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        teardown.delete_all(Environment::Prod).unwrap();

        assert_eq!(confirm.asked.get(), 1);
        assert_eq!(fake.deletes().len(), 3);
    }

    #[test]
    fn prod_all_with_database_token_is_declined() {
        let fake = FakeProvisioner::new().with_stack("acme-database-prod", Complete, &[]);
        let (cfg, sleeper) = (config(), RecordingSleeper::default());
        let confirm = Preset(Some("DELETE-PROD".to_string()));
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let err = teardown.delete_all(Environment::Prod).unwrap_err();

        assert!(matches!(err, StackError::ConfirmationDeclined { .. }));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn network_retries_with_cleanup_before_each_attempt() {
        let fake = FakeProvisioner::new()
            .with_stack(NET, Complete, &[("VpcId", "vpc-0abc")])
            .with_dangling(DanglingKind::NetworkInterface, &["eni-1"])
            .on_delete(
                NET,
                &[
                    &[DeleteInProgress, DeleteFailed],
                    &[DeleteFailed],
                    &[DeleteInProgress, NotFound],
                ],
            );
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let outcome = teardown
            .delete_one(Environment::Dev, StackKind::Network)
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 3 });
        assert_eq!(fake.deletes().len(), 3);
        assert_eq!(fake.releases().len(), 3);

        // Every delete is preceded by a release issued since the previous one.
        let mut released_since_delete = false;
        for call in fake.calls() {
            match call {
                Call::Release(..) => released_since_delete = true,
                Call::Delete(_) => {
                    assert!(released_since_delete, "delete without prior cleanup");
                    released_since_delete = false;
                }
                _ => {}
            }
        }

        let backoffs = sleeper
            .sleeps()
            .iter()
            .filter(|d| **d == Duration::from_secs(30))
            .count();
        // Two back-offs plus the two poll intervals spent in progress.
        assert_eq!(backoffs, 4);
    }

    #[test]
    fn network_gives_up_after_three_attempts() {
        let fake = FakeProvisioner::new()
            .with_stack(NET, Complete, &[("VpcId", "vpc-0abc")])
            .on_delete(NET, &[&[DeleteFailed], &[DeleteFailed], &[DeleteFailed]]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let err = teardown
            .delete_one(Environment::Dev, StackKind::Network)
            .unwrap_err();

        assert!(matches!(
            err,
            StackError::RetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(err.category(), "transient-provisioning-failure");
        assert_eq!(fake.deletes().len(), 3);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(30); 2]);
    }

    #[test]
    fn cleanup_failures_do_not_stop_deletion() {
        let fake = FakeProvisioner::new()
            .with_stack(NET, Complete, &[("VpcId", "vpc-0abc")])
            .with_dangling(DanglingKind::VpcEndpoint, &["vpce-1", "vpce-2"])
            .fail_release(DanglingKind::VpcEndpoint);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let outcome = teardown
            .delete_one(Environment::Dev, StackKind::Network)
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 1 });
        assert_eq!(fake.releases().len(), 2);
    }

    #[test]
    fn unknown_vpc_skips_cleanup() {
        let fake = FakeProvisioner::new()
            .with_stack(NET, Complete, &[])
            .with_dangling(DanglingKind::NetworkInterface, &["eni-1"]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        teardown
            .delete_one(Environment::Dev, StackKind::Network)
            .unwrap();

        assert!(!fake
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ListDangling(_))));
    }

    #[test]
    fn database_delete_failed_is_terminal() {
        let fake = FakeProvisioner::new()
            .with_stack(DB, Complete, &[])
            .on_delete(DB, &[&[DeleteFailed]]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let err = teardown
            .delete_one(Environment::Dev, StackKind::Database)
            .unwrap_err();

        assert_eq!(err.category(), "terminal-provisioning-failure");
        assert_eq!(fake.deletes().len(), 1);
    }

    #[test]
    fn network_timeout_is_reported_and_audit_still_runs() {
        let fake = FakeProvisioner::new()
            .with_stack(NET, Complete, &[("VpcId", "vpc-0abc")])
            .on_delete(NET, &[&[DeleteInProgress]]);
        let mut cfg = config();
        cfg.poll.max_wait_seconds = 60;
        let (sleeper, confirm) = (RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let report = teardown.delete_all(Environment::Dev).unwrap();

        let outcomes: Vec<_> = report.stacks.iter().map(|s| s.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                DeleteOutcome::Absent,
                DeleteOutcome::Absent,
                DeleteOutcome::TimedOut {
                    attempts: 1,
                    last: DeleteInProgress
                },
            ]
        );
        assert_eq!(report.timed_out().count(), 1);
        assert_eq!(fake.deletes().len(), 1);
        assert!(fake
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ListResources(_))));
    }

    #[test]
    fn database_timeout_continues_to_compute() {
        let fake = full_env().on_delete(DB, &[&[DeleteInProgress]]);
        let mut cfg = config();
        cfg.poll.max_wait_seconds = 60;
        let (sleeper, confirm) = (RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let err = teardown.delete_all(Environment::Dev).unwrap_err();

        // Compute still goes; the network then waits on the database.
        assert_eq!(fake.deletes(), vec![DB.to_string(), APP.to_string()]);
        assert!(matches!(
            err,
            StackError::DependencyViolation { ref blocking, .. }
                if blocking == &vec![DB.to_string()]
        ));
    }

    #[test]
    fn buckets_are_reported_never_deleted() {
        let fake = full_env().with_resources(ResourceKind::Bucket, &["acme-uploads-dev"]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let report = teardown.delete_all(Environment::Dev).unwrap();

        let orphan = report.audit.orphans().next().unwrap();
        assert_eq!(orphan.kind, ResourceKind::Bucket);
        assert_eq!(orphan.note, RETAINED_NOTE);
        assert!(!fake.deletes().iter().any(|d| d.contains("uploads")));
    }

    #[test]
    fn list_stacks_reports_existing_in_deploy_order() {
        let fake = FakeProvisioner::new()
            .with_stack(DB, Complete, &[])
            .with_stack(NET, UpdateInProgress, &[("VpcId", "vpc-0abc")]);
        let (cfg, sleeper, confirm) = (config(), RecordingSleeper::default(), no_confirm());
        let teardown = Teardown::new(&cfg, &fake, &sleeper, &confirm);

        let stacks = teardown.list_stacks(Environment::Dev).unwrap();

        let kinds: Vec<_> = stacks.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StackKind::Network, StackKind::Database]);
        assert_eq!(stacks[0].status, UpdateInProgress);
        assert_eq!(stacks[0].output("VpcId"), Some("vpc-0abc"));
    }
}
