//! [`Provisioner`] backed by the `aws` command-line client.
//!
//! Every call runs one `aws ... --output json` subprocess and parses its
//! stdout. Stack lifecycle goes through CloudFormation; pre-cleanup and the
//! orphan sweep query EC2, ECS, ELBv2 and S3 directly.

use crate::error::{Result, StackError};
use crate::provisioner::{DeployRequest, Provisioner, StackRecord};
use crate::types::{DanglingKind, ResourceKind, StackStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct AwsCli {
    bin: PathBuf,
    region: Option<String>,
    profile: Option<String>,
}

impl AwsCli {
    /// Locate `aws` on `PATH`.
    pub fn new(region: Option<String>, profile: Option<String>) -> Result<Self> {
        let bin = which::which("aws").map_err(|_| {
            StackError::ServiceUnavailable(
                "aws CLI not found on PATH; install it and configure credentials".to_string(),
            )
        })?;
        Ok(Self {
            bin,
            region,
            profile,
        })
    }

    fn run(&self, args: &[String]) -> Result<String> {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args).args(["--output", "json"]);
        if let Some(region) = &self.region {
            cmd.args(["--region", region.as_str()]);
        }
        if let Some(profile) = &self.profile {
            cmd.args(["--profile", profile.as_str()]);
        }
        cmd.stdin(Stdio::null());

        tracing::debug!(command = %args.join(" "), "aws");
        let output = cmd.output().map_err(|e| {
            StackError::ServiceUnavailable(format!("failed to spawn aws: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StackError::Command {
                command: format!("aws {}", args.join(" ")),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_strings(&self, args: &[String]) -> Result<Vec<String>> {
        let stdout = self.run(args)?;
        if stdout.trim().is_empty() {
            return Ok(vec![]);
        }
        let value: serde_json::Value = serde_json::from_str(&stdout)?;
        let mut out = Vec::new();
        collect_strings(&value, &mut out);
        Ok(out)
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// describe-stacks parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacks {
    #[serde(default)]
    stacks: Vec<CfnStack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CfnStack {
    stack_name: String,
    stack_status: String,
    #[serde(default)]
    creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    outputs: Vec<CfnOutput>,
    #[serde(default)]
    parameters: Vec<CfnParameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CfnOutput {
    output_key: String,
    #[serde(default)]
    output_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CfnParameter {
    parameter_key: String,
    #[serde(default)]
    parameter_value: String,
}

fn parse_describe_stacks(json: &str) -> Result<Option<StackRecord>> {
    let parsed: DescribeStacks = serde_json::from_str(json)?;
    let Some(stack) = parsed.stacks.into_iter().next() else {
        return Ok(None);
    };
    let status = StackStatus::from_service(&stack.stack_status).unwrap_or_else(|| {
        tracing::warn!(
            stack = %stack.stack_name,
            status = %stack.stack_status,
            "unrecognized stack status, treating as failed"
        );
        StackStatus::Failed
    });
    if status == StackStatus::NotFound {
        return Ok(None);
    }
    Ok(Some(StackRecord {
        name: stack.stack_name,
        status,
        created_at: stack.creation_time,
        outputs: stack
            .outputs
            .into_iter()
            .map(|o| (o.output_key, o.output_value))
            .collect(),
        parameters: stack
            .parameters
            .into_iter()
            .map(|p| (p.parameter_key, p.parameter_value))
            .collect(),
    }))
}

fn is_missing_stack(err: &StackError) -> bool {
    matches!(err, StackError::Command { stderr, .. } if stderr.contains("does not exist"))
}

/// Flatten nested JSON arrays of strings (JMESPath projections nest).
fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}

fn deploy_args(request: &DeployRequest) -> Vec<String> {
    let mut out = args(&[
        "cloudformation",
        "deploy",
        "--stack-name",
        request.stack_name.as_str(),
        "--template-file",
        &*request.template.to_string_lossy(),
        "--no-fail-on-empty-changeset",
    ]);
    if !request.capabilities.is_empty() {
        out.push("--capabilities".to_string());
        out.extend(request.capabilities.iter().cloned());
    }
    if !request.parameters.is_empty() {
        out.push("--parameter-overrides".to_string());
        out.extend(request.parameters.iter().map(|(k, v)| format!("{k}={v}")));
    }
    if !request.tags.is_empty() {
        out.push("--tags".to_string());
        out.extend(request.tags.iter().map(|(k, v)| format!("{k}={v}")));
    }
    out
}

fn resource_query(kind: ResourceKind) -> Vec<String> {
    match kind {
        ResourceKind::ServiceInstance => args(&[
            "ec2",
            "describe-instances",
            "--filters",
            "Name=instance-state-name,Values=pending,running,stopping,stopped",
            "--query",
            "Reservations[].Instances[].Tags[?Key=='Name'].Value",
        ]),
        ResourceKind::Cluster => args(&["ecs", "list-clusters", "--query", "clusterArns"]),
        ResourceKind::LoadBalancer => args(&[
            "elbv2",
            "describe-load-balancers",
            "--query",
            "LoadBalancers[].LoadBalancerName",
        ]),
        ResourceKind::SecurityGroup => args(&[
            "ec2",
            "describe-security-groups",
            "--query",
            "SecurityGroups[].GroupName",
        ]),
        ResourceKind::Bucket => args(&["s3api", "list-buckets", "--query", "Buckets[].Name"]),
    }
}

/// ECS reports cluster ARNs; the name is the last path segment.
fn resource_name(raw: &str) -> &str {
    if raw.starts_with("arn:") {
        raw.rsplit('/').next().unwrap_or(raw)
    } else {
        raw
    }
}

fn dangling_query(vpc_id: &str, kind: DanglingKind) -> Vec<String> {
    let vpc_filter = format!("Name=vpc-id,Values={vpc_id}");
    match kind {
        DanglingKind::RouteTableAssociation => args(&[
            "ec2",
            "describe-route-tables",
            "--filters",
            vpc_filter.as_str(),
            "--query",
            "RouteTables[].Associations[?Main==`false`].RouteTableAssociationId",
        ]),
        DanglingKind::NetworkInterface => args(&[
            "ec2",
            "describe-network-interfaces",
            "--filters",
            vpc_filter.as_str(),
            "Name=status,Values=available",
            "--query",
            "NetworkInterfaces[].NetworkInterfaceId",
        ]),
        DanglingKind::VpcEndpoint => args(&[
            "ec2",
            "describe-vpc-endpoints",
            "--filters",
            vpc_filter.as_str(),
            "--query",
            "VpcEndpoints[].VpcEndpointId",
        ]),
    }
}

fn release_args(kind: DanglingKind, id: &str) -> Vec<String> {
    match kind {
        DanglingKind::RouteTableAssociation => {
            args(&["ec2", "disassociate-route-table", "--association-id", id])
        }
        DanglingKind::NetworkInterface => args(&[
            "ec2",
            "delete-network-interface",
            "--network-interface-id",
            id,
        ]),
        DanglingKind::VpcEndpoint => {
            args(&["ec2", "delete-vpc-endpoints", "--vpc-endpoint-ids", id])
        }
    }
}

// ---------------------------------------------------------------------------
// Provisioner impl
// ---------------------------------------------------------------------------

impl Provisioner for AwsCli {
    fn describe_stack(&self, name: &str) -> Result<Option<StackRecord>> {
        match self.run(&args(&[
            "cloudformation",
            "describe-stacks",
            "--stack-name",
            name,
        ])) {
            Ok(stdout) => parse_describe_stacks(&stdout),
            Err(e) if is_missing_stack(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn deploy(&self, request: &DeployRequest) -> Result<()> {
        self.run(&deploy_args(request)).map_err(|e| match e {
            StackError::Command { stderr, .. } => StackError::Provisioning {
                stack: request.stack_name.clone(),
                detail: format!("deploy failed: {stderr}"),
            },
            other => other,
        })?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.run(&args(&["cloudformation", "delete-stack", "--stack-name", name]))?;
        Ok(())
    }

    fn list_resources(&self, kind: ResourceKind, pattern: &str) -> Result<Vec<String>> {
        let pattern = pattern.to_ascii_lowercase();
        let mut names: Vec<String> = self
            .run_strings(&resource_query(kind))?
            .iter()
            .map(|raw| resource_name(raw).to_string())
            .filter(|name| name.to_ascii_lowercase().contains(&pattern))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn list_dangling(&self, vpc_id: &str, kind: DanglingKind) -> Result<Vec<String>> {
        self.run_strings(&dangling_query(vpc_id, kind))
    }

    fn release_dangling(&self, kind: DanglingKind, id: &str) -> Result<()> {
        self.run(&release_args(kind, id))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
