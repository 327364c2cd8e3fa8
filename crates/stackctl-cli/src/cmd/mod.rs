pub mod deploy;
pub mod teardown;

use anyhow::Context;
use clap::ValueEnum;
use stackctl_core::aws::AwsCli;
use stackctl_core::config::{Config, WarnLevel};
use stackctl_core::secrets::Secrets;
use stackctl_core::types::Environment;
use std::path::{Path, PathBuf};

/// Flags shared by every command.
pub struct Globals {
    pub config: PathBuf,
    pub env_file: Option<PathBuf>,
    pub json: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EnvArg {
    Dev,
    Prod,
}

impl From<EnvArg> for Environment {
    fn from(arg: EnvArg) -> Self {
        match arg {
            EnvArg::Dev => Environment::Dev,
            EnvArg::Prod => Environment::Prod,
        }
    }
}

/// Load the config, log its warnings and reject it on any error-level finding.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config =
        Config::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    for warning in config.validate() {
        if warning.level == WarnLevel::Warning {
            tracing::warn!("{}", warning.message);
        }
    }
    config.ensure_valid()?;
    Ok(config)
}

/// Secrets from `--env-file`, or `./.env` when it exists, merged with the
/// process environment.
pub fn load_secrets(env_file: Option<&Path>) -> anyhow::Result<Secrets> {
    let default = Path::new(".env");
    let path = match env_file {
        Some(path) => Some(path),
        None if default.is_file() => Some(default),
        None => None,
    };
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "reading env file");
    }
    Secrets::from_sources(path)
        .with_context(|| format!("failed to read env file {}", path.unwrap_or(default).display()))
}

pub fn provisioner(config: &Config) -> anyhow::Result<AwsCli> {
    Ok(AwsCli::new(config.region.clone(), config.profile.clone())?)
}
