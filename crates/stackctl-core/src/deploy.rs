//! Dependency-ordered deployment of an environment's stacks.
//!
//! Inputs for each stack are gathered fresh on every run: configured
//! parameters, then outputs of the stacks it consumes, then secrets. Later
//! sources win.

use crate::config::Config;
use crate::error::{Result, StackError};
use crate::poller::{wait_for_terminal, PollOutcome, Sleeper, WaitGoal};
use crate::provisioner::{DeployRequest, Provisioner, NAMED_IAM_CAPABILITY};
use crate::registry::{self, DEPLOY_ORDER, ENTRY_POINT_OUTPUT};
use crate::secrets::{ResolvedSecret, Secrets};
use crate::types::{Environment, StackKind, StackStatus};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployAction {
    Deployed,
    /// Already complete and left untouched.
    Existing,
}

impl DeployAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DeployAction::Deployed => "deployed",
            DeployAction::Existing => "existing",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StackDeployment {
    pub kind: StackKind,
    pub stack: String,
    pub action: DeployAction,
    pub outputs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub environment: Environment,
    pub stacks: Vec<StackDeployment>,
    /// Public address of the compute stack, when it is part of the run.
    pub entry_point: Option<String>,
    /// Parameters that received a placeholder instead of a real secret.
    pub placeholders: Vec<String>,
}

/// What a deploy would do, computed without contacting the service.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStack {
    pub kind: StackKind,
    pub stack: String,
    pub template: PathBuf,
    pub parameters: Vec<String>,
}

/// The stacks `target` would deploy (all when `None`) and the parameter
/// names each would receive. Makes no remote calls.
pub fn plan(config: &Config, env: Environment, target: Option<StackKind>) -> Vec<PlannedStack> {
    let kinds: Vec<StackKind> = match target {
        Some(kind) => vec![kind],
        None => DEPLOY_ORDER.to_vec(),
    };
    kinds
        .into_iter()
        .map(|kind| {
            let mut parameters: BTreeSet<String> =
                config.stack_params(env, kind).into_keys().collect();
            parameters.extend(registry::bindings_for(kind).map(|b| b.parameter.to_string()));
            parameters.extend(config.secrets_for(kind).map(|s| s.parameter.clone()));
            PlannedStack {
                kind,
                stack: registry::stack_name(&config.project, kind, env),
                template: config.template_path(kind),
                parameters: parameters.into_iter().collect(),
            }
        })
        .collect()
}

pub struct Deployer<'a> {
    config: &'a Config,
    secrets: &'a Secrets,
    provisioner: &'a dyn Provisioner,
    sleeper: &'a dyn Sleeper,
    skip_existing: bool,
}

impl<'a> Deployer<'a> {
    pub fn new(
        config: &'a Config,
        secrets: &'a Secrets,
        provisioner: &'a dyn Provisioner,
        sleeper: &'a dyn Sleeper,
    ) -> Self {
        Self {
            config,
            secrets,
            provisioner,
            sleeper,
            skip_existing: true,
        }
    }

    /// When false, `deploy_all` redeploys stacks that are already complete.
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    pub fn deploy_all(&self, env: Environment) -> Result<DeployReport> {
        let secrets = self.resolve_secrets(&DEPLOY_ORDER)?;
        let mut stacks = Vec::with_capacity(DEPLOY_ORDER.len());
        for kind in DEPLOY_ORDER {
            let kind_secrets = secrets.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
            stacks.push(self.deploy_kind(env, kind, kind_secrets, self.skip_existing)?);
        }
        Ok(self.report(env, stacks, &secrets))
    }

    /// Deploy a single stack. Always issues the deploy, which is an update
    /// when the stack already exists.
    pub fn deploy_one(&self, env: Environment, kind: StackKind) -> Result<DeployReport> {
        let secrets = self.resolve_secrets(&[kind])?;
        let kind_secrets = secrets.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
        let deployment = self.deploy_kind(env, kind, kind_secrets, false)?;
        Ok(self.report(env, vec![deployment], &secrets))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Resolve secrets for `kinds`, reporting every missing one at once.
    fn resolve_secrets(
        &self,
        kinds: &[StackKind],
    ) -> Result<HashMap<StackKind, Vec<ResolvedSecret>>> {
        let specs: Vec<_> = self
            .config
            .secrets
            .iter()
            .filter(|s| kinds.contains(&s.stack))
            .collect();
        let resolved = self.secrets.resolve(specs.iter().copied())?;

        let mut by_kind: HashMap<StackKind, Vec<ResolvedSecret>> = HashMap::new();
        for (spec, secret) in specs.into_iter().zip(resolved) {
            if secret.placeholder {
                tracing::warn!(
                    secret = %spec.env,
                    parameter = %secret.parameter,
                    "secret not set; using placeholder until a real value is deployed"
                );
            }
            by_kind.entry(spec.stack).or_default().push(secret);
        }
        Ok(by_kind)
    }

    fn deploy_kind(
        &self,
        env: Environment,
        kind: StackKind,
        secrets: &[ResolvedSecret],
        skip_existing: bool,
    ) -> Result<StackDeployment> {
        let name = registry::stack_name(&self.config.project, kind, env);

        let mut status = self.provisioner.describe_status(&name)?;
        if status.is_in_progress() {
            tracing::info!(
                stack = %name,
                %status,
                "operation in progress; waiting for it to settle"
            );
            status = match wait_for_terminal(
                self.provisioner,
                self.sleeper,
                &name,
                WaitGoal::Settled,
                &self.config.poll_policy(),
            )? {
                PollOutcome::Done { status, .. } | PollOutcome::Failed { status, .. } => status,
                PollOutcome::TimedOut { last, .. } => {
                    return Err(StackError::Provisioning {
                        stack: name,
                        detail: format!("still {last} after waiting; retry once it settles"),
                    });
                }
            };
        }

        if skip_existing && status == StackStatus::Complete {
            tracing::info!(stack = %name, "already deployed; skipping");
            return Ok(StackDeployment {
                kind,
                outputs: self.provisioner.list_outputs(&name)?,
                stack: name,
                action: DeployAction::Existing,
            });
        }

        let request = DeployRequest {
            parameters: self.gather_inputs(env, kind, &name, secrets)?,
            template: self.config.template_path(kind),
            capabilities: vec![NAMED_IAM_CAPABILITY.to_string()],
            tags: vec![
                ("Project".to_string(), self.config.project.clone()),
                ("Environment".to_string(), env.to_string()),
                ("Stack".to_string(), kind.to_string()),
            ],
            stack_name: name.clone(),
        };

        tracing::info!(
            stack = %name,
            template = %request.template.display(),
            parameters = request.parameters.len(),
            "deploying stack"
        );
        self.provisioner.deploy(&request)?;
        tracing::info!(stack = %name, "stack deployed");

        Ok(StackDeployment {
            kind,
            outputs: self.provisioner.list_outputs(&name)?,
            stack: name,
            action: DeployAction::Deployed,
        })
    }

    fn gather_inputs(
        &self,
        env: Environment,
        kind: StackKind,
        name: &str,
        secrets: &[ResolvedSecret],
    ) -> Result<BTreeMap<String, String>> {
        let mut params = self.config.stack_params(env, kind);

        // Outputs per producer; `None` when the producer stack does not exist.
        let mut producers: HashMap<StackKind, Option<Vec<(String, String)>>> = HashMap::new();
        for binding in registry::bindings_for(kind) {
            let producer_name = registry::stack_name(&self.config.project, binding.producer, env);
            if !producers.contains_key(&binding.producer) {
                let outputs = self
                    .provisioner
                    .describe_stack(&producer_name)?
                    .map(|r| r.outputs);
                producers.insert(binding.producer, outputs);
            }

            let value = match producers.get(&binding.producer) {
                Some(Some(outputs)) => outputs
                    .iter()
                    .find(|(k, _)| k == binding.output)
                    .map(|(_, v)| v.clone()),
                _ => None,
            };
            let stack_exists = matches!(producers.get(&binding.producer), Some(Some(_)));

            match value {
                Some(value) => {
                    params.insert(binding.parameter.to_string(), value);
                }
                None if binding.soft => {
                    tracing::warn!(
                        stack = %name,
                        parameter = binding.parameter,
                        producer = %producer_name,
                        "optional input unavailable; passing empty value"
                    );
                    params.insert(binding.parameter.to_string(), String::new());
                }
                None if stack_exists => {
                    return Err(StackError::MissingPrerequisite {
                        stack: name.to_string(),
                        detail: format!("{producer_name} has no output {}", binding.output),
                    });
                }
                None => {
                    return Err(StackError::MissingPrerequisite {
                        stack: name.to_string(),
                        detail: format!(
                            "{producer_name} does not exist; deploy {} first",
                            binding.producer
                        ),
                    });
                }
            }
        }

        for secret in secrets {
            params.insert(secret.parameter.clone(), secret.value.clone());
        }
        Ok(params)
    }

    fn report(
        &self,
        env: Environment,
        stacks: Vec<StackDeployment>,
        secrets: &HashMap<StackKind, Vec<ResolvedSecret>>,
    ) -> DeployReport {
        let entry_point = stacks
            .iter()
            .find(|s| s.kind == StackKind::Compute)
            .and_then(|s| {
                s.outputs
                    .iter()
                    .find(|(k, _)| k == ENTRY_POINT_OUTPUT)
                    .map(|(_, v)| v.clone())
            });
        let mut placeholders: Vec<String> = stacks
            .iter()
            .filter(|s| s.action == DeployAction::Deployed)
            .filter_map(|s| secrets.get(&s.kind))
            .flatten()
            .filter(|s| s.placeholder)
            .map(|s| s.parameter.clone())
            .collect();
        placeholders.sort();
        DeployReport {
            environment: env,
            stacks,
            entry_point,
            placeholders,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
