use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot deploy {stack}: {detail}")]
    MissingPrerequisite { stack: String, detail: String },

    #[error("cannot delete {stack}: dependent stacks still exist: {}", blocking.join(", "))]
    DependencyViolation {
        stack: String,
        blocking: Vec<String>,
    },

    #[error("{action} not confirmed; nothing was deleted")]
    ConfirmationDeclined { action: String },

    #[error("{stack} still failing to delete after {attempts} attempts")]
    RetriesExhausted { stack: String, attempts: u32 },

    #[error("{stack}: {detail}")]
    Provisioning { stack: String, detail: String },

    #[error("provisioning service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StackError {
    /// Operator-facing failure category, printed ahead of the message.
    pub fn category(&self) -> &'static str {
        match self {
            StackError::Validation(_) | StackError::MissingPrerequisite { .. } => "validation",
            StackError::DependencyViolation { .. } => "dependency-violation",
            StackError::ConfirmationDeclined { .. } => "confirmation-declined",
            StackError::RetriesExhausted { .. } => "transient-provisioning-failure",
            StackError::Provisioning { .. } => "terminal-provisioning-failure",
            StackError::ServiceUnavailable(_) | StackError::Command { .. } => {
                "provisioning-service"
            }
            StackError::Config(_) => "config",
            StackError::Io(_) => "io",
            StackError::Yaml(_) => "yaml",
            StackError::Json(_) => "json",
        }
    }

    /// True when the failure happened before any remote mutation was issued.
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            StackError::Validation(_)
                | StackError::MissingPrerequisite { .. }
                | StackError::DependencyViolation { .. }
                | StackError::ConfirmationDeclined { .. }
                | StackError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
