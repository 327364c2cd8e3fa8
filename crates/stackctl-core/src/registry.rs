//! Static knowledge of the three stack kinds: ordering, dependencies,
//! naming, and which outputs feed which parameters.

use crate::types::{Environment, StackKind};

pub const DEPLOY_ORDER: [StackKind; 3] =
    [StackKind::Network, StackKind::Compute, StackKind::Database];

pub const TEARDOWN_ORDER: [StackKind; 3] =
    [StackKind::Database, StackKind::Compute, StackKind::Network];

/// Compute stack output holding the public load balancer address.
pub const ENTRY_POINT_OUTPUT: &str = "LoadBalancerDns";

/// Network stack output naming the VPC that pre-cleanup sweeps.
pub const VPC_ID_OUTPUT: &str = "VpcId";

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// External stack name: `{project}-{kind}-{env}`.
pub fn stack_name(project: &str, kind: StackKind, env: Environment) -> String {
    format!("{project}-{}-{env}", kind.as_str())
}

/// True when `name` is `{project}-...` and one of the hyphen-separated
/// segments after the project is exactly the environment. Case-insensitive.
///
/// Resources created by the stacks are named `{project}-...-{env}`, possibly
/// with a suffix appended by the service, so the environment segment need
/// not be last. `acme-devportal-prod` is a prod resource, not a dev one.
pub fn matches_environment(name: &str, project: &str, env: Environment) -> bool {
    let name = name.to_ascii_lowercase();
    let project = project.to_ascii_lowercase();
    let Some(rest) = name
        .strip_prefix(project.as_str())
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };
    rest.split('-').any(|segment| segment == env.as_str())
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// How one stack's output reaches another stack's parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputBinding {
    pub consumer: StackKind,
    pub parameter: &'static str,
    pub producer: StackKind,
    pub output: &'static str,
    /// Soft bindings may be empty when the producer is not deployed yet.
    pub soft: bool,
}

const BINDINGS: &[InputBinding] = &[
    InputBinding {
        consumer: StackKind::Compute,
        parameter: "VpcId",
        producer: StackKind::Network,
        output: VPC_ID_OUTPUT,
        soft: false,
    },
    InputBinding {
        consumer: StackKind::Compute,
        parameter: "PublicSubnetIds",
        producer: StackKind::Network,
        output: "PublicSubnetIds",
        soft: false,
    },
    InputBinding {
        consumer: StackKind::Compute,
        parameter: "PrivateSubnetIds",
        producer: StackKind::Network,
        output: "PrivateSubnetIds",
        soft: false,
    },
    InputBinding {
        consumer: StackKind::Database,
        parameter: "VpcId",
        producer: StackKind::Network,
        output: VPC_ID_OUTPUT,
        soft: false,
    },
    InputBinding {
        consumer: StackKind::Database,
        parameter: "PrivateSubnetIds",
        producer: StackKind::Network,
        output: "PrivateSubnetIds",
        soft: false,
    },
    InputBinding {
        consumer: StackKind::Database,
        parameter: "AppSecurityGroupId",
        producer: StackKind::Compute,
        output: "AppSecurityGroupId",
        soft: true,
    },
];

pub fn bindings_for(consumer: StackKind) -> impl Iterator<Item = &'static InputBinding> {
    BINDINGS.iter().filter(move |b| b.consumer == consumer)
}

/// Kinds `kind` cannot be deployed without.
pub fn hard_dependencies(kind: StackKind) -> Vec<StackKind> {
    dependencies(kind, false)
}

/// Kinds `kind` consumes from when they exist.
pub fn soft_dependencies(kind: StackKind) -> Vec<StackKind> {
    dependencies(kind, true)
}

fn dependencies(kind: StackKind, soft: bool) -> Vec<StackKind> {
    let mut deps: Vec<StackKind> = bindings_for(kind)
        .filter(|b| b.soft == soft)
        .map(|b| b.producer)
        .collect();
    deps.sort();
    deps.dedup();
    // A kind that is a hard dependency is never also reported as soft.
    if soft {
        let hard = dependencies(kind, false);
        deps.retain(|d| !hard.contains(d));
    }
    deps
}

/// Kinds that hard-depend on `kind` and therefore must be gone before it
/// may be deleted.
pub fn dependents(kind: StackKind) -> Vec<StackKind> {
    DEPLOY_ORDER
        .iter()
        .copied()
        .filter(|k| hard_dependencies(*k).contains(&kind))
        .collect()
}

/// Kinds that reference `kind` only softly.
pub fn soft_dependents(kind: StackKind) -> Vec<StackKind> {
    DEPLOY_ORDER
        .iter()
        .copied()
        .filter(|k| soft_dependencies(*k).contains(&kind))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_names_follow_convention() {
        assert_eq!(
            stack_name("acme", StackKind::Network, Environment::Dev),
            "acme-network-dev"
        );
        assert_eq!(
            stack_name("acme", StackKind::Database, Environment::Prod),
            "acme-database-prod"
        );
    }

    #[test]
    fn environments_never_collide() {
        for kind in DEPLOY_ORDER {
            assert_ne!(
                stack_name("acme", kind, Environment::Dev),
                stack_name("acme", kind, Environment::Prod)
            );
        }
    }

    #[test]
    fn teardown_is_reverse_of_deploy() {
        let mut reversed = DEPLOY_ORDER;
        reversed.reverse();
        assert_eq!(reversed, TEARDOWN_ORDER);
    }

    #[test]
    fn deploy_order_respects_dependencies() {
        for (i, kind) in DEPLOY_ORDER.iter().enumerate() {
            for dep in hard_dependencies(*kind)
                .into_iter()
                .chain(soft_dependencies(*kind))
            {
                let pos = DEPLOY_ORDER.iter().position(|k| *k == dep).unwrap();
                assert!(pos < i, "{dep} must deploy before {kind}");
            }
        }
    }

    #[test]
    fn dependency_edges() {
        assert!(hard_dependencies(StackKind::Network).is_empty());
        assert_eq!(hard_dependencies(StackKind::Compute), vec![StackKind::Network]);
        assert_eq!(hard_dependencies(StackKind::Database), vec![StackKind::Network]);
        assert_eq!(soft_dependencies(StackKind::Database), vec![StackKind::Compute]);
        assert_eq!(
            dependents(StackKind::Network),
            vec![StackKind::Compute, StackKind::Database]
        );
        assert!(dependents(StackKind::Compute).is_empty());
        assert_eq!(soft_dependents(StackKind::Compute), vec![StackKind::Database]);
    }

    #[test]
    fn environment_matching() {
        assert!(matches_environment("acme-cluster-dev", "acme", Environment::Dev));
        assert!(matches_environment(
            "ACME-ALB-PROD-1234",
            "acme",
            Environment::Prod
        ));
        assert!(!matches_environment("acme-cluster-prod", "acme", Environment::Dev));
        assert!(!matches_environment("other-cluster-dev", "acme", Environment::Dev));
    }

    #[test]
    fn environment_must_be_a_whole_segment() {
        assert!(!matches_environment("acme-devportal-prod", "acme", Environment::Dev));
        assert!(matches_environment("acme-devportal-prod", "acme", Environment::Prod));
        assert!(!matches_environment("acme-production-x-dev", "acme", Environment::Prod));
        assert!(matches_environment("acme-production-x-dev", "acme", Environment::Dev));
        assert!(!matches_environment("acmecorp-alb-dev", "acme", Environment::Dev));
        assert!(!matches_environment("team-acme-dev", "acme", Environment::Dev));
        assert!(matches_environment("my-app-db-dev", "my-app", Environment::Dev));
    }
}
