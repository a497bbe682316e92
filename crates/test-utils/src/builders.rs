#![allow(dead_code)]

use std::time::Duration;

use agentloop::store::JsonStore;
use agentloop::tasks::{ObstaclesDocument, RunPaths, RunStateEntry, Task, TasksDocument};
use agentloop::types::TaskStatus;
use tempfile::TempDir;

/// Builder for `Task` to simplify test setup.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: Task::new(id, format!("Task {id}")),
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = title.to_string();
        self
    }

    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.task.dependencies = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn completed(self) -> Self {
        self.status(TaskStatus::Completed)
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.task.attempts = attempts;
        self
    }

    pub fn max_attempts(mut self, max: u32) -> Self {
        self.task.max_attempts = max;
        self
    }

    pub fn blocked(mut self) -> Self {
        self.task.blocked = true;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

/// A project directory in a `TempDir` with the three shared documents.
///
/// The directory is deleted when the fixture is dropped.
pub struct ProjectFixture {
    pub dir: TempDir,
    pub paths: RunPaths,
    pub store: JsonStore,
}

impl ProjectFixture {
    /// Seed `tasks.json` with `tasks` and empty run-state/obstacle logs.
    pub fn new(tasks: Vec<Task>) -> Self {
        let fixture = Self::empty();
        fixture
            .store
            .write(&fixture.paths.tasks, &TasksDocument::new(tasks))
            .expect("seed tasks.json");
        fixture
            .paths
            .ensure_logs(&fixture.store)
            .expect("seed run-state and obstacles");
        fixture
    }

    /// A project directory with no documents at all.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let paths = RunPaths::in_dir(dir.path());
        let store = JsonStore::new(Duration::from_secs(5));
        Self { dir, paths, store }
    }

    pub fn tasks(&self) -> TasksDocument {
        self.store.read_only(&self.paths.tasks).expect("read tasks.json")
    }

    pub fn task(&self, id: &str) -> Task {
        self.tasks()
            .get(id)
            .cloned()
            .unwrap_or_else(|| panic!("task {id} not in tasks.json"))
    }

    pub fn state(&self) -> Vec<RunStateEntry> {
        self.store.read_only(&self.paths.state).expect("read state.json")
    }

    pub fn obstacles(&self) -> ObstaclesDocument {
        self.store
            .read_only(&self.paths.obstacles)
            .expect("read obstacles.json")
    }
}
