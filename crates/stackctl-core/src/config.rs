use crate::error::{Result, StackError};
use crate::poller::PollPolicy;
use crate::registry::DEPLOY_ORDER;
use crate::teardown::RetryPolicy;
use crate::types::{Environment, StackKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "stackctl.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PollConfig / RetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: u64,
}

fn default_interval() -> u64 {
    30
}

fn default_max_wait() -> u64 {
    1800
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            max_wait_seconds: default_max_wait(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total delete attempts for the network stack, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff")]
    pub backoff_seconds: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_seconds: default_backoff(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stack parameters
// ---------------------------------------------------------------------------

/// A scalar template parameter. YAML integers and booleans are accepted and
/// rendered as the strings the provisioning service expects. Decimals parse
/// but fail validation, since the YAML float loses trailing zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Per-environment sizing and network parameters, one map per stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub network: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub compute: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub database: BTreeMap<String, ParamValue>,
}

impl EnvironmentConfig {
    pub fn params_for(&self, kind: StackKind) -> &BTreeMap<String, ParamValue> {
        match kind {
            StackKind::Network => &self.network,
            StackKind::Compute => &self.compute,
            StackKind::Database => &self.database,
        }
    }
}

// ---------------------------------------------------------------------------
// SecretSpec
// ---------------------------------------------------------------------------

/// An application secret read from the process environment and passed to
/// one stack as a template parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretSpec {
    /// Environment variable name.
    pub env: String,
    pub stack: StackKind,
    pub parameter: String,
    /// Allow a missing value, substituting the connection-string placeholder.
    #[serde(default)]
    pub placeholder: bool,
}

fn default_secrets() -> Vec<SecretSpec> {
    let spec = |env: &str, stack, parameter: &str, placeholder| SecretSpec {
        env: env.to_string(),
        stack,
        parameter: parameter.to_string(),
        placeholder,
    };
    vec![
        spec("DATABASE_URL", StackKind::Compute, "DatabaseUrl", true),
        spec("STRIPE_API_KEY", StackKind::Compute, "StripeApiKey", false),
        spec("SENDGRID_API_KEY", StackKind::Compute, "SendgridApiKey", false),
        spec("DB_USERNAME", StackKind::Database, "DbUsername", false),
        spec("DB_PASSWORD", StackKind::Database, "DbPassword", false),
    ]
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub environments: HashMap<Environment, EnvironmentConfig>,
    #[serde(default = "default_secrets")]
    pub secrets: Vec<SecretSpec>,
    /// Directory the config was loaded from; relative paths resolve here.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

impl Config {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            region: None,
            profile: None,
            templates_dir: default_templates_dir(),
            poll: PollConfig::default(),
            retry: RetryConfig::default(),
            environments: HashMap::new(),
            secrets: default_secrets(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StackError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let mut cfg: Config = serde_yaml::from_str(&data)?;
        cfg.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(cfg)
    }

    /// Template file for a stack kind, resolved against the config directory.
    pub fn template_path(&self, kind: StackKind) -> PathBuf {
        self.base_dir
            .join(&self.templates_dir)
            .join(kind.template_file())
    }

    /// Configured parameters for one stack in one environment, rendered to strings.
    pub fn stack_params(&self, env: Environment, kind: StackKind) -> BTreeMap<String, String> {
        self.environments
            .get(&env)
            .map(|e| {
                e.params_for(kind)
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn secrets_for(&self, kind: StackKind) -> impl Iterator<Item = &SecretSpec> {
        self.secrets.iter().filter(move |s| s.stack == kind)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll.interval_seconds),
            max_wait: Duration::from_secs(self.poll.max_wait_seconds),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            backoff: Duration::from_secs(self.retry.backoff_seconds),
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !project_re().is_match(&self.project) || self.project.len() > 32 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "invalid project '{}': must be lowercase alphanumeric with hyphens, \
                     at most 32 chars",
                    self.project
                ),
            });
        }

        for env in Environment::all() {
            if !self.environments.contains_key(env) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "no parameters configured for environment '{env}'; template defaults apply"
                    ),
                });
            }
        }

        if self.retry.max_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        } else if self.retry.max_attempts > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "retry.max_attempts={} (>10 is unusual)",
                    self.retry.max_attempts
                ),
            });
        }

        if self.poll.interval_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "poll.interval_seconds must be at least 1".to_string(),
            });
        } else if self.poll.interval_seconds > self.poll.max_wait_seconds {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "poll.interval_seconds={} exceeds poll.max_wait_seconds={}; \
                     stacks are polled once",
                    self.poll.interval_seconds, self.poll.max_wait_seconds
                ),
            });
        }

        // serde_yaml reads 14.10 as the float 14.1; only quoted text survives.
        for env in Environment::all() {
            let Some(params) = self.environments.get(env) else {
                continue;
            };
            for kind in DEPLOY_ORDER {
                for (name, value) in params.params_for(kind) {
                    if let ParamValue::Float(x) = value {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Error,
                            message: format!(
                                "parameter '{name}' of the {env} {kind} stack is the decimal \
                                 {x}; quote it so it reaches the stack unchanged"
                            ),
                        });
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for secret in &self.secrets {
            if !seen.insert((&secret.env, secret.stack)) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "secret '{}' is listed twice for the {} stack",
                        secret.env, secret.stack
                    ),
                });
            }
        }

        warnings
    }

    /// Fail on any error-level validation finding.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors: Vec<String> = self
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(StackError::Config(errors.join("; ")))
        }
    }
}

static PROJECT_RE: OnceLock<Regex> = OnceLock::new();

fn project_re() -> &'static Regex {
    PROJECT_RE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9\-]*[a-z0-9]$|^[a-z]$").expect("static regex is valid")
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
