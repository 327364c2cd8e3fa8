use crate::error::StackError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn all() -> &'static [Environment] {
        &[Environment::Dev, Environment::Prod]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }

    /// Destructive actions against this environment need a typed confirmation.
    pub fn is_protected(self) -> bool {
        matches!(self, Environment::Prod)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(StackError::Validation(format!(
                "invalid environment '{s}': expected one of dev, prod"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// StackKind
// ---------------------------------------------------------------------------

/// Variant order is deployment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackKind {
    Network,
    Compute,
    Database,
}

impl StackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StackKind::Network => "network",
            StackKind::Compute => "compute",
            StackKind::Database => "database",
        }
    }

    pub fn template_file(self) -> &'static str {
        match self {
            StackKind::Network => "network.yaml",
            StackKind::Compute => "compute.yaml",
            StackKind::Database => "database.yaml",
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StackKind {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "network" | "vpc" => Ok(StackKind::Network),
            "compute" => Ok(StackKind::Compute),
            "database" => Ok(StackKind::Database),
            _ => Err(StackError::Validation(format!(
                "invalid stack '{s}': expected one of network, compute, database"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// StackStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackStatus {
    NotFound,
    CreateInProgress,
    UpdateInProgress,
    DeleteInProgress,
    Complete,
    Failed,
    DeleteFailed,
}

impl StackStatus {
    /// Map a provisioning-service status string onto the lifecycle states
    /// the orchestrators reason about. Returns `None` for unknown strings.
    pub fn from_service(raw: &str) -> Option<StackStatus> {
        let status = match raw {
            "CREATE_IN_PROGRESS" | "REVIEW_IN_PROGRESS" | "IMPORT_IN_PROGRESS" => {
                StackStatus::CreateInProgress
            }
            "UPDATE_IN_PROGRESS"
            | "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS"
            | "UPDATE_ROLLBACK_IN_PROGRESS"
            | "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            | "ROLLBACK_IN_PROGRESS"
            | "IMPORT_ROLLBACK_IN_PROGRESS" => StackStatus::UpdateInProgress,
            "DELETE_IN_PROGRESS" => StackStatus::DeleteInProgress,
            "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "UPDATE_ROLLBACK_COMPLETE"
            | "IMPORT_COMPLETE" | "IMPORT_ROLLBACK_COMPLETE" => StackStatus::Complete,
            "CREATE_FAILED" | "ROLLBACK_COMPLETE" | "ROLLBACK_FAILED" | "UPDATE_FAILED"
            | "UPDATE_ROLLBACK_FAILED" | "IMPORT_ROLLBACK_FAILED" => StackStatus::Failed,
            "DELETE_FAILED" => StackStatus::DeleteFailed,
            "DELETE_COMPLETE" => StackStatus::NotFound,
            _ => return None,
        };
        Some(status)
    }

    pub fn exists(self) -> bool {
        self != StackStatus::NotFound
    }

    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            StackStatus::CreateInProgress
                | StackStatus::UpdateInProgress
                | StackStatus::DeleteInProgress
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StackStatus::NotFound => "not-found",
            StackStatus::CreateInProgress => "create-in-progress",
            StackStatus::UpdateInProgress => "update-in-progress",
            StackStatus::DeleteInProgress => "delete-in-progress",
            StackStatus::Complete => "complete",
            StackStatus::Failed => "failed",
            StackStatus::DeleteFailed => "delete-failed",
        }
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StackInstance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackInstance {
    pub name: String,
    pub kind: StackKind,
    pub environment: Environment,
    pub status: StackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outputs: Vec<(String, String)>,
    #[serde(default)]
    pub parameters: Vec<(String, String)>,
}

impl StackInstance {
    pub fn output(&self, key: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// Resource categories the orphan audit sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ServiceInstance,
    Cluster,
    LoadBalancer,
    SecurityGroup,
    Bucket,
}

impl ResourceKind {
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::ServiceInstance,
            ResourceKind::Cluster,
            ResourceKind::LoadBalancer,
            ResourceKind::SecurityGroup,
            ResourceKind::Bucket,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::ServiceInstance => "service-instances",
            ResourceKind::Cluster => "clusters",
            ResourceKind::LoadBalancer => "load-balancers",
            ResourceKind::SecurityGroup => "security-groups",
            ResourceKind::Bucket => "buckets",
        }
    }

    /// Buckets hold data and are kept when their stack goes away.
    pub fn retained_by_policy(self) -> bool {
        matches!(self, ResourceKind::Bucket)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachments inside a VPC that commonly block its deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingKind {
    RouteTableAssociation,
    NetworkInterface,
    VpcEndpoint,
}

impl DanglingKind {
    pub fn all() -> &'static [DanglingKind] {
        &[
            DanglingKind::RouteTableAssociation,
            DanglingKind::NetworkInterface,
            DanglingKind::VpcEndpoint,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DanglingKind::RouteTableAssociation => "route-table-association",
            DanglingKind::NetworkInterface => "network-interface",
            DanglingKind::VpcEndpoint => "vpc-endpoint",
        }
    }
}

impl fmt::Display for DanglingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
