// src/engine/termination.rs

use std::collections::HashSet;
use std::fmt;

use crate::dag::{all_complete, first_exhausted};
use crate::tasks::Task;

/// Why a scheduler loop stopped.
///
/// The `Display` form is the human-readable reason handed to the
/// summarize hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Every task is `completed`.
    AllCompleted,
    /// A task used up its retry budget without completing.
    TaskExhausted {
        id: String,
        title: String,
        max_attempts: u32,
    },
    /// The sequential loop ran its full iteration budget.
    IterationLimit(u32),
    /// The agent reported that its usage limit was reached.
    RateLimited,
    /// Nothing is running and nothing can be dispatched, yet some tasks are
    /// still incomplete (e.g. they are `blocked` or wait on blocked tasks).
    Stalled { waiting: Vec<String> },
    /// The loop failed with an error (e.g. a lock timeout).
    Aborted(String),
}

impl Termination {
    pub fn exhausted(task: &Task) -> Self {
        Termination::TaskExhausted {
            id: task.id.clone(),
            title: task.title.clone(),
            max_attempts: task.max_attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Termination::AllCompleted)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::AllCompleted => write!(f, "All tasks completed successfully."),
            Termination::TaskExhausted {
                id,
                title,
                max_attempts,
            } => write!(f, "Task {id} ('{title}') reached max_attempts ({max_attempts})."),
            Termination::IterationLimit(n) => {
                write!(f, "Reached maximum iteration limit ({n}).")
            }
            Termination::RateLimited => write!(f, "Claude Code usage limit has been reached."),
            Termination::Stalled { waiting } => write!(
                f,
                "No task can make progress; still waiting on: {}.",
                waiting.join(", ")
            ),
            Termination::Aborted(msg) => write!(f, "Scheduler aborted: {msg}"),
        }
    }
}

/// Terminal condition shared by both schedulers: all tasks complete, or
/// some task exhausted its retry budget.
pub fn exit_condition(tasks: &[Task]) -> Option<Termination> {
    exit_condition_excluding(tasks, &HashSet::new())
}

/// Like [`exit_condition`], but tasks in `in_flight` are not yet judged
/// exhausted: their latest attempt has not reported back.
pub fn exit_condition_excluding(tasks: &[Task], in_flight: &HashSet<&str>) -> Option<Termination> {
    if all_complete(tasks) {
        return Some(Termination::AllCompleted);
    }

    let settled: Vec<Task> = tasks
        .iter()
        .filter(|t| !in_flight.contains(t.id.as_str()))
        .cloned()
        .collect();
    first_exhausted(&settled).map(Termination::exhausted)
}
