// src/tasks/layout.rs

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::debug;

use crate::errors::Result;
use crate::store::JsonStore;

/// Locations of one project's shared documents.
///
/// All paths are explicit so that a scheduler can be pointed at any
/// directory (tests use a `TempDir`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// `{"tasks": [...]}`
    pub tasks: PathBuf,
    /// Bare array of run-state entries.
    pub state: PathBuf,
    /// `{"obstacles": [...]}`
    pub obstacles: PathBuf,
}

impl RunPaths {
    /// `<state_dir>/<project>/{tasks,state,obstacles}.json`
    pub fn for_project(state_dir: impl AsRef<Path>, project: &str) -> Self {
        Self::in_dir(state_dir.as_ref().join(project))
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            tasks: dir.join("tasks.json"),
            state: dir.join("state.json"),
            obstacles: dir.join("obstacles.json"),
        }
    }

    /// Create empty run-state and obstacle documents if they do not exist.
    pub fn ensure_logs(&self, store: &JsonStore) -> Result<()> {
        if store.create_if_missing(&self.state, &json!([]))? {
            debug!(path = %self.state.display(), "created empty run-state log");
        }
        if store.create_if_missing(&self.obstacles, &json!({"obstacles": []}))? {
            debug!(path = %self.obstacles.display(), "created empty obstacles document");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn project_paths_are_nested_under_state_dir() {
        let paths = RunPaths::for_project(".agentloop", "demo");
        assert_eq!(paths.tasks, PathBuf::from(".agentloop/demo/tasks.json"));
        assert_eq!(paths.state, PathBuf::from(".agentloop/demo/state.json"));
        assert_eq!(paths.obstacles, PathBuf::from(".agentloop/demo/obstacles.json"));
    }

    #[test]
    fn ensure_logs_creates_empty_documents_once() {
        let dir = TempDir::new().unwrap();
        let paths = RunPaths::in_dir(dir.path());
        let store = JsonStore::default();

        paths.ensure_logs(&store).unwrap();
        let state: Value = store.read_only(&paths.state).unwrap();
        let obstacles: Value = store.read_only(&paths.obstacles).unwrap();
        assert_eq!(state, serde_json::json!([]));
        assert_eq!(obstacles, serde_json::json!({"obstacles": []}));

        store.write(&paths.state, &serde_json::json!([{"task_id": "T1"}])).unwrap();
        paths.ensure_logs(&store).unwrap();
        let state: Value = store.read_only(&paths.state).unwrap();
        assert_eq!(state.as_array().map(|a| a.len()), Some(1));
    }
}
