// src/tasks/model.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{AgentloopError, Result};
use crate::types::TaskStatus;

/// Retry budget used when a task does not specify `max_attempts`.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

/// One unit of work in `tasks.json`.
///
/// Fields not known to the scheduler are kept in `extra` and written back
/// untouched, so agents and other tools can annotate tasks freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Ids of tasks that must be `completed` before this one is ready.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub status: TaskStatus,

    /// Number of dispatches so far, including the one in flight.
    #[serde(default)]
    pub attempts: u32,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Manually parked tasks are never dispatched.
    #[serde(default)]
    pub blocked: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            dependencies: Vec::new(),
            status: TaskStatus::Pending,
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            blocked: false,
            extra: Map::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// The retry budget is used up and the task never completed.
    pub fn is_exhausted(&self) -> bool {
        !self.is_completed() && self.attempts >= self.max_attempts
    }
}

/// `tasks.json`: `{"tasks": [Task, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasksDocument {
    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TasksDocument {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            extra: Map::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AgentloopError::TaskNotFound(id.to_string()))
    }
}

/// One entry of the append-only run-state log (`state.json`, a bare array).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStateEntry {
    pub task_id: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub files_modified: Vec<String>,

    #[serde(default)]
    pub obstacles: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunStateEntry {
    /// Entry recorded by the scheduler when an agent reports success.
    pub fn completed(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            summary: String::new(),
            files_modified: Vec::new(),
            obstacles: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A recorded failure of one task attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Sequential id of the form `O<n>`.
    pub id: String,
    pub task_id: String,
    pub message: String,

    #[serde(default)]
    pub resolved: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `obstacles.json`: `{"obstacles": [Obstacle, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstaclesDocument {
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObstaclesDocument {
    /// Next free sequential id.
    ///
    /// Must be called under the same lock as the append that uses it.
    pub fn next_id(&self) -> String {
        let highest = self
            .obstacles
            .iter()
            .filter_map(|o| o.id.strip_prefix('O'))
            .filter_map(|n| n.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        format!("O{}", highest.max(self.obstacles.len()) + 1)
    }

    /// Append a new unresolved obstacle for `task_id` and return its id.
    pub fn record(&mut self, task_id: &str, message: impl Into<String>) -> String {
        let id = self.next_id();
        self.obstacles.push(Obstacle {
            id: id.clone(),
            task_id: task_id.to_string(),
            message: message.into(),
            resolved: false,
            extra: Map::new(),
        });
        id
    }

    pub fn for_task<'a>(&'a self, task_id: &'a str) -> impl Iterator<Item = &'a Obstacle> + 'a {
        self.obstacles.iter().filter(move |o| o.task_id == task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let task: Task = serde_json::from_value(json!({"id": "T1"})).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.max_attempts, 3);
        assert!(!task.blocked);
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "project": "demo",
            "tasks": [{"id": "T1", "title": "t", "acceptance_criteria": ["a", "b"]}]
        });
        let doc: TasksDocument = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["project"], "demo");
        assert_eq!(back["tasks"][0]["acceptance_criteria"], json!(["a", "b"]));
    }

    #[test]
    fn exhaustion_ignores_completed_tasks() {
        let mut t = Task::new("T1", "one");
        t.max_attempts = 2;
        t.attempts = 2;
        assert!(t.is_exhausted());
        t.status = TaskStatus::Completed;
        assert!(!t.is_exhausted());
    }

    #[test]
    fn obstacle_ids_are_sequential() {
        let mut doc = ObstaclesDocument::default();
        assert_eq!(doc.record("T1", "first"), "O1");
        assert_eq!(doc.record("T2", "second"), "O2");
        assert_eq!(doc.for_task("T1").count(), 1);
    }

    #[test]
    fn obstacle_ids_skip_past_existing_numbers() {
        let mut doc: ObstaclesDocument = serde_json::from_value(json!({
            "obstacles": [{"id": "O7", "task_id": "T1", "message": "m"}]
        }))
        .unwrap();
        assert_eq!(doc.record("T1", "again"), "O8");
    }

    #[test]
    fn task_mut_reports_unknown_ids() {
        let mut doc = TasksDocument::new(vec![Task::new("T1", "one")]);
        assert!(doc.task_mut("T1").is_ok());
        assert!(matches!(
            doc.task_mut("T9"),
            Err(AgentloopError::TaskNotFound(id)) if id == "T9"
        ));
    }
}
