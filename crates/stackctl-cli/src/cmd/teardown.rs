use super::{load_config, provisioner, Globals};
use crate::output::{print_json, print_table};
use clap::ValueEnum;
use stackctl_core::audit::{self, AuditReport, CategoryResult};
use stackctl_core::confirm::{required_token, Confirm, DeleteTarget, Preset, StdinPrompt};
use stackctl_core::poller::ThreadSleeper;
use stackctl_core::registry::{self, TEARDOWN_ORDER};
use stackctl_core::teardown::{DeleteOutcome, Teardown, TeardownReport};
use stackctl_core::types::{Environment, StackKind};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TeardownTarget {
    #[value(alias = "vpc")]
    Network,
    Compute,
    Database,
    All,
    /// Show existing stacks
    List,
    /// Look for resources left outside any stack
    Check,
}

impl TeardownTarget {
    fn delete_target(self) -> Option<DeleteTarget> {
        match self {
            TeardownTarget::Network => Some(DeleteTarget::Stack(StackKind::Network)),
            TeardownTarget::Compute => Some(DeleteTarget::Stack(StackKind::Compute)),
            TeardownTarget::Database => Some(DeleteTarget::Stack(StackKind::Database)),
            TeardownTarget::All => Some(DeleteTarget::All),
            TeardownTarget::List | TeardownTarget::Check => None,
        }
    }
}

pub fn run(
    globals: &Globals,
    env: Environment,
    target: TeardownTarget,
    confirm: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(&globals.config)?;

    if globals.dry_run {
        match target.delete_target() {
            Some(delete) => print_plan(&config.project, env, delete),
            None => println!("list and check are read-only; nothing to plan."),
        }
        return Ok(());
    }

    let aws = provisioner(&config)?;
    let confirm: Box<dyn Confirm> = match confirm {
        Some(token) => Box::new(Preset(Some(token))),
        None => Box::new(StdinPrompt),
    };
    let teardown = Teardown::new(&config, &aws, &ThreadSleeper, confirm.as_ref());

    match target {
        TeardownTarget::List => {
            let stacks = teardown.list_stacks(env)?;
            if globals.json {
                return print_json(&stacks);
            }
            if stacks.is_empty() {
                println!("No stacks found for {env}.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = stacks
                .iter()
                .map(|s| {
                    vec![
                        s.name.clone(),
                        s.kind.to_string(),
                        s.status.to_string(),
                        s.created_at
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            print_table(&["STACK", "KIND", "STATUS", "CREATED"], &rows);
            Ok(())
        }
        TeardownTarget::Check => {
            let report = audit::audit(&config, &aws, env);
            if globals.json {
                return print_json(&report);
            }
            print_audit(&report);
            Ok(())
        }
        TeardownTarget::All => {
            let report = teardown.delete_all(env)?;
            if globals.json {
                return print_json(&report);
            }
            print_teardown(&report);
            Ok(())
        }
        TeardownTarget::Network => delete_one(&teardown, globals, env, StackKind::Network),
        TeardownTarget::Compute => delete_one(&teardown, globals, env, StackKind::Compute),
        TeardownTarget::Database => delete_one(&teardown, globals, env, StackKind::Database),
    }
}

fn delete_one(
    teardown: &Teardown,
    globals: &Globals,
    env: Environment,
    kind: StackKind,
) -> anyhow::Result<()> {
    let outcome = teardown.delete_one(env, kind)?;
    if globals.json {
        return print_json(&outcome);
    }
    println!("{kind} ({env}): {}", describe_outcome(&outcome));
    Ok(())
}

fn print_plan(project: &str, env: Environment, target: DeleteTarget) {
    let kinds: Vec<StackKind> = match target {
        DeleteTarget::All => TEARDOWN_ORDER.to_vec(),
        DeleteTarget::Stack(kind) => vec![kind],
    };
    println!("Teardown plan for {env} (no changes made):");
    for (i, kind) in kinds.iter().enumerate() {
        println!("  {}. {}", i + 1, registry::stack_name(project, *kind, env));
    }
    if let Some(token) = required_token(env, target) {
        println!("Requires confirmation: {token}");
    }
    if matches!(target, DeleteTarget::All) {
        println!("Followed by an orphan resource check.");
    }
}

fn describe_outcome(outcome: &DeleteOutcome) -> String {
    match outcome {
        DeleteOutcome::Absent => "not found, nothing to delete".to_string(),
        DeleteOutcome::Deleted { attempts: 1 } => "deleted".to_string(),
        DeleteOutcome::Deleted { attempts } => format!("deleted after {attempts} attempts"),
        DeleteOutcome::TimedOut { last, .. } => {
            format!("still {last} after the wait limit; re-run to confirm")
        }
    }
}

fn print_teardown(report: &TeardownReport) {
    let rows: Vec<Vec<String>> = report
        .stacks
        .iter()
        .map(|s| vec![s.stack.clone(), describe_outcome(&s.outcome)])
        .collect();
    print_table(&["STACK", "RESULT"], &rows);
    println!();
    print_audit(&report.audit);
}

fn print_audit(report: &AuditReport) {
    if report.is_clean() {
        println!("No leftover resources found for {}.", report.environment);
        return;
    }
    let mut rows = Vec::new();
    for category in &report.categories {
        match &category.result {
            CategoryResult::Clean => {}
            CategoryResult::Found(found) => rows.extend(found.iter().map(|o| {
                vec![
                    category.kind.to_string(),
                    o.name.clone(),
                    o.note.to_string(),
                ]
            })),
            CategoryResult::QueryFailed(reason) => rows.push(vec![
                category.kind.to_string(),
                "-".to_string(),
                format!("query failed: {reason}"),
            ]),
        }
    }
    print_table(&["CATEGORY", "RESOURCE", "NOTE"], &rows);
}
