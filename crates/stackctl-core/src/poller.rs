//! Blocking wait for a stack to reach a terminal state.
//!
//! Three outcomes are distinguished: the goal was reached, the stack landed
//! in a failure state, or the wait ran out while the operation may still be
//! in flight. The last one is not an error; callers warn and move on.

use crate::error::Result;
use crate::provisioner::Provisioner;
use crate::types::StackStatus;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_wait: Duration::from_secs(1800),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitGoal {
    /// Wait until the stack is gone.
    Deleted,
    /// Wait until no operation is in progress on the stack.
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    Done { status: StackStatus, polls: u32 },
    Failed { status: StackStatus, polls: u32 },
    TimedOut { last: StackStatus, polls: u32 },
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub fn wait_for_terminal(
    provisioner: &dyn Provisioner,
    sleeper: &dyn Sleeper,
    stack: &str,
    goal: WaitGoal,
    policy: &PollPolicy,
) -> Result<PollOutcome> {
    // A zero interval would never advance the clock.
    let step = policy.interval.max(Duration::from_millis(1));
    let mut waited = Duration::ZERO;
    let mut polls = 0;

    loop {
        let status = provisioner.describe_status(stack)?;
        polls += 1;
        tracing::debug!(stack = %stack, %status, polls, waited_secs = waited.as_secs(), "poll");

        match goal {
            WaitGoal::Deleted => match status {
                StackStatus::NotFound => return Ok(PollOutcome::Done { status, polls }),
                StackStatus::DeleteFailed => return Ok(PollOutcome::Failed { status, polls }),
                _ => {}
            },
            WaitGoal::Settled => {
                if !status.is_in_progress() {
                    return Ok(PollOutcome::Done { status, polls });
                }
            }
        }

        if waited >= policy.max_wait {
            return Ok(PollOutcome::TimedOut {
                last: status,
                polls,
            });
        }

        sleeper.sleep(policy.interval);
        waited += step;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
