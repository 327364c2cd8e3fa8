//! The narrow interface the orchestrators use to talk to the stack
//! provisioning service.

use crate::error::Result;
use crate::types::{DanglingKind, Environment, ResourceKind, StackInstance, StackKind, StackStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Capability the templates need to create named IAM resources.
pub const NAMED_IAM_CAPABILITY: &str = "CAPABILITY_NAMED_IAM";

/// A stack as the provisioning service reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct StackRecord {
    pub name: String,
    pub status: StackStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub outputs: Vec<(String, String)>,
    pub parameters: Vec<(String, String)>,
}

impl StackRecord {
    pub fn into_instance(self, kind: StackKind, environment: Environment) -> StackInstance {
        StackInstance {
            name: self.name,
            kind,
            environment,
            status: self.status,
            created_at: self.created_at,
            outputs: self.outputs,
            parameters: self.parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployRequest {
    pub stack_name: String,
    pub template: PathBuf,
    pub parameters: BTreeMap<String, String>,
    pub capabilities: Vec<String>,
    pub tags: Vec<(String, String)>,
}

pub trait Provisioner {
    /// `None` when no stack with this name exists.
    fn describe_stack(&self, name: &str) -> Result<Option<StackRecord>>;

    fn describe_status(&self, name: &str) -> Result<StackStatus> {
        Ok(self
            .describe_stack(name)?
            .map(|r| r.status)
            .unwrap_or(StackStatus::NotFound))
    }

    fn list_outputs(&self, name: &str) -> Result<Vec<(String, String)>> {
        Ok(self
            .describe_stack(name)?
            .map(|r| r.outputs)
            .unwrap_or_default())
    }

    /// Create or update a stack. Blocks until the service reaches a terminal
    /// state and errors if that state is a failure.
    fn deploy(&self, request: &DeployRequest) -> Result<()>;

    /// Request deletion. Returns once the request is accepted.
    fn delete(&self, name: &str) -> Result<()>;

    /// Names of resources of `kind` whose name contains `pattern`.
    fn list_resources(&self, kind: ResourceKind, pattern: &str) -> Result<Vec<String>>;

    /// Ids of attachments of `kind` inside the VPC that may block its deletion.
    fn list_dangling(&self, vpc_id: &str, kind: DanglingKind) -> Result<Vec<String>>;

    fn release_dangling(&self, kind: DanglingKind, id: &str) -> Result<()>;
}
