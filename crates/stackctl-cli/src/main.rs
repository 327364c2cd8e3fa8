mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{deploy::DeployTarget, teardown::TeardownTarget, EnvArg, Globals};
use stackctl_core::config::DEFAULT_CONFIG_FILE;
use stackctl_core::StackError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stackctl",
    about = "Deploy and tear down the network, compute and database stacks of an environment",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file
    #[arg(long, global = true, env = "STACKCTL_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// KEY=VALUE file with secrets (default: .env when present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Print what would happen without contacting the provisioning service
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy stacks in dependency order (network, compute, database)
    Deploy {
        env: EnvArg,

        #[arg(value_enum, default_value_t = DeployTarget::All)]
        target: DeployTarget,

        /// Redeploy stacks that are already complete
        #[arg(long)]
        redeploy: bool,
    },

    /// Delete stacks in reverse order, list them, or check for leftovers
    Teardown {
        env: EnvArg,

        #[arg(value_enum, default_value_t = TeardownTarget::List)]
        target: TeardownTarget,

        /// Confirmation phrase for protected deletions (skips the prompt)
        #[arg(long)]
        confirm: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.json {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let globals = Globals {
        config: cli.config,
        env_file: cli.env_file,
        json: cli.json,
        dry_run: cli.dry_run,
    };

    let result = match cli.command {
        Commands::Deploy {
            env,
            target,
            redeploy,
        } => cmd::deploy::run(&globals, env.into(), target, redeploy),
        Commands::Teardown {
            env,
            target,
            confirm,
        } => cmd::teardown::run(&globals, env.into(), target, confirm),
    };

    if let Err(e) = result {
        match e.chain().find_map(|c| c.downcast_ref::<StackError>()) {
            Some(err) => eprintln!("error: {}: {e:#}", err.category()),
            None => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }
}
