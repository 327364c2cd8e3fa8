use super::{load_config, load_secrets, provisioner, Globals};
use crate::output::{print_json, print_table};
use clap::ValueEnum;
use stackctl_core::deploy::{self, DeployReport, Deployer};
use stackctl_core::poller::ThreadSleeper;
use stackctl_core::types::{Environment, StackKind};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeployTarget {
    #[value(alias = "vpc")]
    Network,
    Compute,
    Database,
    All,
}

impl DeployTarget {
    fn kind(self) -> Option<StackKind> {
        match self {
            DeployTarget::Network => Some(StackKind::Network),
            DeployTarget::Compute => Some(StackKind::Compute),
            DeployTarget::Database => Some(StackKind::Database),
            DeployTarget::All => None,
        }
    }
}

pub fn run(
    globals: &Globals,
    env: Environment,
    target: DeployTarget,
    redeploy: bool,
) -> anyhow::Result<()> {
    let config = load_config(&globals.config)?;

    if globals.dry_run {
        let plan = deploy::plan(&config, env, target.kind());
        if globals.json {
            return print_json(&plan);
        }
        println!("Deploy plan for {env} (no changes made):");
        let rows: Vec<Vec<String>> = plan
            .iter()
            .map(|p| {
                vec![
                    p.stack.clone(),
                    p.template.display().to_string(),
                    p.parameters.join(", "),
                ]
            })
            .collect();
        print_table(&["STACK", "TEMPLATE", "PARAMETERS"], &rows);
        return Ok(());
    }

    let secrets = load_secrets(globals.env_file.as_deref())?;
    let aws = provisioner(&config)?;
    let deployer = Deployer::new(&config, &secrets, &aws, &ThreadSleeper).skip_existing(!redeploy);

    let report = match target.kind() {
        Some(kind) => deployer.deploy_one(env, kind)?,
        None => deployer.deploy_all(env)?,
    };

    if globals.json {
        print_json(&report)
    } else {
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &DeployReport) {
    let rows: Vec<Vec<String>> = report
        .stacks
        .iter()
        .map(|s| {
            vec![
                s.stack.clone(),
                s.kind.to_string(),
                s.action.as_str().to_string(),
            ]
        })
        .collect();
    print_table(&["STACK", "KIND", "ACTION"], &rows);

    if let Some(entry_point) = &report.entry_point {
        println!("\nEntry point: http://{entry_point}");
    }
    if !report.placeholders.is_empty() {
        println!(
            "\nPlaceholder values deployed for: {}. Redeploy once the real values exist.",
            report.placeholders.join(", ")
        );
    }
}
