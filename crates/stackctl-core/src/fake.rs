//! In-memory [`Provisioner`] driven by scripted status sequences, plus a
//! [`Sleeper`] that records instead of sleeping.

use crate::error::{Result, StackError};
use crate::poller::Sleeper;
use crate::provisioner::{DeployRequest, Provisioner, StackRecord};
use crate::types::{DanglingKind, ResourceKind, StackStatus};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::time::Duration;

/// One recorded call against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Describe(String),
    Deploy(String),
    Delete(String),
    ListResources(ResourceKind),
    ListDangling(DanglingKind),
    Release(DanglingKind, String),
}

#[derive(Debug, Clone)]
struct FakeStack {
    record: StackRecord,
    /// Statuses returned by successive describes; the last one sticks.
    script: VecDeque<StackStatus>,
}

#[derive(Debug, Default)]
struct State {
    stacks: BTreeMap<String, FakeStack>,
    /// Per stack, one status sequence per delete call.
    delete_scripts: HashMap<String, VecDeque<Vec<StackStatus>>>,
    deploy_outputs: HashMap<String, Vec<(String, String)>>,
    deploy_failures: HashSet<String>,
    resources: HashMap<ResourceKind, std::result::Result<Vec<String>, String>>,
    dangling: HashMap<DanglingKind, Vec<String>>,
    release_failures: HashSet<DanglingKind>,
    calls: Vec<Call>,
    requests: Vec<DeployRequest>,
}

#[derive(Debug, Default)]
pub struct FakeProvisioner {
    state: RefCell<State>,
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl FakeProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Setup
    // -----------------------------------------------------------------------

    pub fn with_stack(self, name: &str, status: StackStatus, outputs: &[(&str, &str)]) -> Self {
        self.state.borrow_mut().stacks.insert(
            name.to_string(),
            FakeStack {
                record: StackRecord {
                    name: name.to_string(),
                    status,
                    created_at: None,
                    outputs: pairs(outputs),
                    parameters: vec![],
                },
                script: VecDeque::new(),
            },
        );
        self
    }

    /// Statuses the next describes of `name` return, in order.
    pub fn script_status(self, name: &str, statuses: &[StackStatus]) -> Self {
        if let Some(stack) = self.state.borrow_mut().stacks.get_mut(name) {
            stack.script = statuses.iter().copied().collect();
        }
        self
    }

    /// For each successive delete call on `name`, the statuses the following
    /// describes return. Without a script a delete removes the stack at once.
    pub fn on_delete(self, name: &str, attempts: &[&[StackStatus]]) -> Self {
        self.state.borrow_mut().delete_scripts.insert(
            name.to_string(),
            attempts.iter().map(|a| a.to_vec()).collect(),
        );
        self
    }

    pub fn with_deploy_outputs(self, name: &str, outputs: &[(&str, &str)]) -> Self {
        self.state
            .borrow_mut()
            .deploy_outputs
            .insert(name.to_string(), pairs(outputs));
        self
    }

    pub fn fail_deploy(self, name: &str) -> Self {
        self.state
            .borrow_mut()
            .deploy_failures
            .insert(name.to_string());
        self
    }

    pub fn with_resources(self, kind: ResourceKind, names: &[&str]) -> Self {
        self.state.borrow_mut().resources.insert(
            kind,
            Ok(names.iter().map(|n| n.to_string()).collect()),
        );
        self
    }

    pub fn fail_resources(self, kind: ResourceKind, message: &str) -> Self {
        self.state
            .borrow_mut()
            .resources
            .insert(kind, Err(message.to_string()));
        self
    }

    pub fn with_dangling(self, kind: DanglingKind, ids: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .dangling
            .insert(kind, ids.iter().map(|i| i.to_string()).collect());
        self
    }

    pub fn fail_release(self, kind: DanglingKind) -> Self {
        self.state.borrow_mut().release_failures.insert(kind);
        self
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Stack names passed to `deploy`, in call order.
    pub fn deploys(&self) -> Vec<String> {
        self.filter_calls(|c| match c {
            Call::Deploy(n) => Some(n.clone()),
            _ => None,
        })
    }

    /// Stack names passed to `delete`, in call order.
    pub fn deletes(&self) -> Vec<String> {
        self.filter_calls(|c| match c {
            Call::Delete(n) => Some(n.clone()),
            _ => None,
        })
    }

    pub fn releases(&self) -> Vec<(DanglingKind, String)> {
        self.filter_calls(|c| match c {
            Call::Release(k, id) => Some((*k, id.clone())),
            _ => None,
        })
    }

    pub fn describe_count(&self, name: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Describe(n) if n == name))
            .count()
    }

    pub fn deploy_requests(&self) -> Vec<DeployRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn status_of(&self, name: &str) -> StackStatus {
        self.state
            .borrow()
            .stacks
            .get(name)
            .map(|s| s.record.status)
            .unwrap_or(StackStatus::NotFound)
    }

    fn filter_calls<T>(&self, f: impl Fn(&Call) -> Option<T>) -> Vec<T> {
        self.state.borrow().calls.iter().filter_map(f).collect()
    }
}

impl Provisioner for FakeProvisioner {
    fn describe_stack(&self, name: &str) -> Result<Option<StackRecord>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Describe(name.to_string()));
        let Some(stack) = state.stacks.get_mut(name) else {
            return Ok(None);
        };
        if let Some(next) = stack.script.pop_front() {
            stack.record.status = next;
        }
        if stack.record.status == StackStatus::NotFound {
            state.stacks.remove(name);
            return Ok(None);
        }
        Ok(Some(stack.record.clone()))
    }

    fn deploy(&self, request: &DeployRequest) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let name = request.stack_name.clone();
        state.calls.push(Call::Deploy(name.clone()));
        state.requests.push(request.clone());
        if state.deploy_failures.contains(&name) {
            return Err(StackError::Provisioning {
                stack: name,
                detail: "deploy failed: CREATE_FAILED".to_string(),
            });
        }
        let outputs = state.deploy_outputs.get(&name).cloned();
        let parameters: Vec<(String, String)> = request
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let stack = state.stacks.entry(name.clone()).or_insert_with(|| FakeStack {
            record: StackRecord {
                name: name.clone(),
                status: StackStatus::Complete,
                created_at: None,
                outputs: vec![],
                parameters: vec![],
            },
            script: VecDeque::new(),
        });
        stack.record.status = StackStatus::Complete;
        stack.record.parameters = parameters;
        if let Some(outputs) = outputs {
            stack.record.outputs = outputs;
        }
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Delete(name.to_string()));
        let script = state
            .delete_scripts
            .get_mut(name)
            .and_then(|attempts| attempts.pop_front())
            .unwrap_or_else(|| vec![StackStatus::NotFound]);
        if let Some(stack) = state.stacks.get_mut(name) {
            stack.record.status = StackStatus::DeleteInProgress;
            stack.script = script.into();
        }
        Ok(())
    }

    fn list_resources(&self, kind: ResourceKind, pattern: &str) -> Result<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::ListResources(kind));
        match state.resources.get(&kind) {
            None => Ok(vec![]),
            Some(Ok(names)) => Ok(names
                .iter()
                .filter(|n| n.to_ascii_lowercase().contains(&pattern.to_ascii_lowercase()))
                .cloned()
                .collect()),
            Some(Err(message)) => Err(StackError::Command {
                command: format!("list {kind}"),
                stderr: message.clone(),
            }),
        }
    }

    fn list_dangling(&self, _vpc_id: &str, kind: DanglingKind) -> Result<Vec<String>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::ListDangling(kind));
        Ok(state.dangling.get(&kind).cloned().unwrap_or_default())
    }

    fn release_dangling(&self, kind: DanglingKind, id: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Release(kind, id.to_string()));
        if state.release_failures.contains(&kind) {
            return Err(StackError::Command {
                command: format!("release {kind} {id}"),
                stderr: "DependencyViolation: resource is in use".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingSleeper
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn total(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}
