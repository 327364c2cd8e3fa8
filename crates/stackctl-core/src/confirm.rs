//! Typed confirmation for irreversible production deletions.

use crate::error::{Result, StackError};
use crate::registry::{self, TEARDOWN_ORDER};
use crate::types::{Environment, StackKind};
use std::io::{BufRead, Write};

pub const PROD_DATABASE_TOKEN: &str = "DELETE-PROD";
pub const PROD_ALL_TOKEN: &str = "DELETE-ALL-PROD";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Stack(StackKind),
    All,
}

impl std::fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteTarget::Stack(kind) => write!(f, "{kind}"),
            DeleteTarget::All => f.write_str("all"),
        }
    }
}

/// The phrase an operator must type before `target` is deleted in `env`,
/// or `None` when no confirmation is needed.
pub fn required_token(env: Environment, target: DeleteTarget) -> Option<&'static str> {
    if !env.is_protected() {
        return None;
    }
    match target {
        DeleteTarget::Stack(StackKind::Database) => Some(PROD_DATABASE_TOKEN),
        DeleteTarget::All => Some(PROD_ALL_TOKEN),
        DeleteTarget::Stack(_) => None,
    }
}

pub trait Confirm {
    /// Show `prompt` and return the operator's answer, or `None` when no
    /// answer can be obtained.
    fn ask(&self, prompt: &str) -> Result<Option<String>>;
}

/// An answer supplied up front (e.g. `--confirm DELETE-PROD`).
#[derive(Debug, Clone, Default)]
pub struct Preset(pub Option<String>);

impl Confirm for Preset {
    fn ask(&self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Reads one line from stdin after printing the prompt to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn ask(&self, prompt: &str) -> Result<Option<String>> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{prompt}")?;
        stderr.flush()?;
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Gate a deletion. Makes no remote calls; on anything but the exact token
/// returns [`StackError::ConfirmationDeclined`].
pub fn confirm_delete(
    confirm: &dyn Confirm,
    env: Environment,
    target: DeleteTarget,
    project: &str,
) -> Result<()> {
    let Some(token) = required_token(env, target) else {
        return Ok(());
    };
    let what = match target {
        DeleteTarget::All => format!("ALL stacks of {project} in {env}, including the database"),
        DeleteTarget::Stack(kind) => format!("the {project} {kind} stack in {env}"),
    };
    let prompt = format!(
        "This permanently deletes {what}. Data loss is irreversible.\nType {token} to continue: "
    );
    match confirm.ask(&prompt)? {
        Some(answer) if answer == token => {
            tracing::info!(%env, %target, "deletion confirmed");
            Ok(())
        }
        _ => Err(StackError::ConfirmationDeclined {
            action: format!("delete {}", stack_names(project, env, target)),
        }),
    }
}

fn stack_names(project: &str, env: Environment, target: DeleteTarget) -> String {
    match target {
        DeleteTarget::Stack(kind) => registry::stack_name(project, kind, env),
        DeleteTarget::All => TEARDOWN_ORDER
            .iter()
            .map(|&kind| registry::stack_name(project, kind, env))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(answer: &str) -> Preset {
        Preset(Some(answer.to_string()))
    }

    #[test]
    fn tokens_only_for_prod_database_and_all() {
        use DeleteTarget::*;
        assert_eq!(
            required_token(Environment::Prod, Stack(StackKind::Database)),
            Some(PROD_DATABASE_TOKEN)
        );
        assert_eq!(required_token(Environment::Prod, All), Some(PROD_ALL_TOKEN));
        assert_eq!(required_token(Environment::Prod, Stack(StackKind::Network)), None);
        assert_eq!(required_token(Environment::Prod, Stack(StackKind::Compute)), None);
        assert_eq!(required_token(Environment::Dev, Stack(StackKind::Database)), None);
        assert_eq!(required_token(Environment::Dev, All), None);
    }

    #[test]
    fn exact_token_passes() {
        let target = DeleteTarget::Stack(StackKind::Database);
        assert!(confirm_delete(&preset("DELETE-PROD"), Environment::Prod, target, "acme").is_ok());
    }

    #[test]
    fn near_misses_are_declined() {
        let target = DeleteTarget::Stack(StackKind::Database);
        for answer in ["delete-prod", "DELETE-PROD ", "yes", "", "DELETE-ALL-PROD"] {
            let result = confirm_delete(&preset(answer), Environment::Prod, target, "acme");
            assert!(
                matches!(result, Err(StackError::ConfirmationDeclined { .. })),
                "expected decline for {answer:?}"
            );
        }
    }

    #[test]
    fn all_needs_the_all_token() {
        assert!(confirm_delete(
            &preset("DELETE-PROD"),
            Environment::Prod,
            DeleteTarget::All,
            "acme"
        )
        .is_err());
        assert!(confirm_delete(
            &preset("DELETE-ALL-PROD"),
            Environment::Prod,
            DeleteTarget::All,
            "acme"
        )
        .is_ok());
    }

    #[test]
    fn no_answer_is_declined() {
        let result = confirm_delete(
            &Preset(None),
            Environment::Prod,
            DeleteTarget::All,
            "acme",
        );
        assert!(matches!(result, Err(StackError::ConfirmationDeclined { .. })));
    }

    #[test]
    fn declined_error_names_the_stacks() {
        let target = DeleteTarget::Stack(StackKind::Database);
        let err = confirm_delete(&preset("no"), Environment::Prod, target, "acme").unwrap_err();
        assert_eq!(
            err.to_string(),
            "delete acme-database-prod not confirmed; nothing was deleted"
        );

        let err = confirm_delete(&Preset(None), Environment::Prod, DeleteTarget::All, "acme")
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("delete acme-database-prod, acme-compute-prod, acme-network-prod"));
    }

    #[test]
    fn dev_never_asks() {
        assert!(confirm_delete(&Preset(None), Environment::Dev, DeleteTarget::All, "acme").is_ok());
    }
}
