use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a task as persisted in `tasks.json`.
///
/// - `Pending`: waiting to be dispatched (possibly after a failed attempt).
/// - `InProgress`: an agent is currently working on it.
/// - `Completed`: terminal; never dispatched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "invalid task status: {other} (expected \"pending\", \"in_progress\" or \"completed\")"
            )),
        }
    }
}

/// Which scheduler variant `execute` should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One agent per iteration, bounded by an iteration limit.
    Sequential,
    /// One agent per ready task, dispatched concurrently.
    Async,
}

impl ExecutionMode {
    pub fn from_flag(asynchronous: bool) -> Self {
        if asynchronous {
            ExecutionMode::Async
        } else {
            ExecutionMode::Sequential
        }
    }
}
