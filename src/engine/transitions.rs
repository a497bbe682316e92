// src/engine/transitions.rs

//! Locked state transitions applied by the async scheduler.
//!
//! Each function is one `locked_read_modify_write` per document, so every
//! mutation observes the latest on-disk state and no update is lost when
//! several agents finish in the same cycle.

use tracing::{debug, warn};

use crate::errors::Result;
use crate::store::JsonStore;
use crate::tasks::{ObstaclesDocument, RunPaths, RunStateEntry, TasksDocument};
use crate::types::TaskStatus;

/// Claim `task_id` for a new attempt: `status = in_progress`, `attempts += 1`.
///
/// Returns the attempt number, or `None` if the task is no longer
/// dispatchable on disk (someone else changed it since our last read).
pub fn mark_dispatched(store: &JsonStore, paths: &RunPaths, task_id: &str) -> Result<Option<u32>> {
    store.locked_read_modify_write(&paths.tasks, |doc: &mut TasksDocument| {
        let task = doc.task_mut(task_id)?;
        if task.status != TaskStatus::Pending || task.blocked || task.attempts >= task.max_attempts {
            warn!(
                task = %task_id,
                status = %task.status,
                attempts = task.attempts,
                "task changed on disk before dispatch; skipping"
            );
            return Ok(None);
        }
        task.status = TaskStatus::InProgress;
        task.attempts += 1;
        Ok(Some(task.attempts))
    })
}

/// Record a successful attempt: mark the task `completed` and append one
/// run-state entry.
pub fn record_success(store: &JsonStore, paths: &RunPaths, task_id: &str) -> Result<()> {
    store.locked_read_modify_write(&paths.tasks, |doc: &mut TasksDocument| {
        doc.task_mut(task_id)?.status = TaskStatus::Completed;
        Ok(())
    })?;

    store.locked_read_modify_write(&paths.state, |log: &mut Vec<RunStateEntry>| {
        log.push(RunStateEntry::completed(task_id));
        Ok(())
    })?;

    debug!(task = %task_id, "recorded completion");
    Ok(())
}

/// Record a failed attempt: append an obstacle (id assigned under the
/// obstacles lock) and put the task back to `pending`. `attempts` is left
/// as is.
///
/// Returns the new obstacle id.
pub fn record_failure(
    store: &JsonStore,
    paths: &RunPaths,
    task_id: &str,
    message: &str,
) -> Result<String> {
    let obstacle_id =
        store.locked_read_modify_write(&paths.obstacles, |doc: &mut ObstaclesDocument| {
            Ok(doc.record(task_id, message))
        })?;

    store.locked_read_modify_write(&paths.tasks, |doc: &mut TasksDocument| {
        doc.task_mut(task_id)?.status = TaskStatus::Pending;
        Ok(())
    })?;

    debug!(task = %task_id, obstacle = %obstacle_id, "recorded failure");
    Ok(obstacle_id)
}

/// Put every `in_progress` task back to `pending`.
///
/// Used when a scheduler starts: nothing can be in flight yet, so such
/// tasks were orphaned by an earlier run that stopped mid-attempt.
pub fn recover_orphans(store: &JsonStore, paths: &RunPaths) -> Result<Vec<String>> {
    store.locked_read_modify_write(&paths.tasks, |doc: &mut TasksDocument| {
        let mut recovered = Vec::new();
        for task in doc.tasks.iter_mut() {
            if task.status == TaskStatus::InProgress {
                task.status = TaskStatus::Pending;
                recovered.push(task.id.clone());
            }
        }
        Ok(recovered)
    })
}

/// Bulk reset of a project's run: every task back to `pending` with no
/// attempts and unblocked, run-state and obstacles emptied.
pub fn reset_run(store: &JsonStore, paths: &RunPaths) -> Result<usize> {
    let count = store.locked_read_modify_write(&paths.tasks, |doc: &mut TasksDocument| {
        for task in doc.tasks.iter_mut() {
            task.status = TaskStatus::Pending;
            task.attempts = 0;
            task.blocked = false;
        }
        Ok(doc.tasks.len())
    })?;
    store.write(&paths.state, &Vec::<RunStateEntry>::new())?;
    store.write(&paths.obstacles, &ObstaclesDocument::default())?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentloopError;
    use crate::tasks::Task;
    use tempfile::TempDir;

    fn setup(tasks: Vec<Task>) -> (TempDir, RunPaths, JsonStore) {
        let dir = TempDir::new().unwrap();
        let paths = RunPaths::in_dir(dir.path());
        let store = JsonStore::default();
        store.write(&paths.tasks, &TasksDocument::new(tasks)).unwrap();
        paths.ensure_logs(&store).unwrap();
        (dir, paths, store)
    }

    fn tasks(store: &JsonStore, paths: &RunPaths) -> TasksDocument {
        store.read_only(&paths.tasks).unwrap()
    }

    #[test]
    fn dispatch_claims_and_counts_attempt() {
        let (_dir, paths, store) = setup(vec![Task::new("T1", "one")]);

        assert_eq!(mark_dispatched(&store, &paths, "T1").unwrap(), Some(1));
        let doc = tasks(&store, &paths);
        assert_eq!(doc.tasks[0].status, TaskStatus::InProgress);
        assert_eq!(doc.tasks[0].attempts, 1);

        // Already in progress: not claimable again.
        assert_eq!(mark_dispatched(&store, &paths, "T1").unwrap(), None);
        assert_eq!(tasks(&store, &paths).tasks[0].attempts, 1);
    }

    #[test]
    fn dispatch_of_unknown_task_is_an_error() {
        let (_dir, paths, store) = setup(vec![Task::new("T1", "one")]);
        assert!(matches!(
            mark_dispatched(&store, &paths, "nope"),
            Err(AgentloopError::TaskNotFound(_))
        ));
    }

    #[test]
    fn failure_appends_obstacle_and_keeps_attempts() {
        let (_dir, paths, store) = setup(vec![Task::new("T1", "one")]);
        mark_dispatched(&store, &paths, "T1").unwrap();

        let id = record_failure(&store, &paths, "T1", "exit 1").unwrap();
        assert_eq!(id, "O1");

        let doc = tasks(&store, &paths);
        assert_eq!(doc.tasks[0].status, TaskStatus::Pending);
        assert_eq!(doc.tasks[0].attempts, 1);

        let obstacles: ObstaclesDocument = store.read_only(&paths.obstacles).unwrap();
        assert_eq!(obstacles.obstacles.len(), 1);
        assert_eq!(obstacles.obstacles[0].task_id, "T1");
        assert!(!obstacles.obstacles[0].resolved);
    }

    #[test]
    fn success_completes_and_logs_once() {
        let (_dir, paths, store) = setup(vec![Task::new("T1", "one")]);
        mark_dispatched(&store, &paths, "T1").unwrap();
        record_success(&store, &paths, "T1").unwrap();

        assert!(tasks(&store, &paths).tasks[0].is_completed());
        let log: Vec<RunStateEntry> = store.read_only(&paths.state).unwrap();
        assert_eq!(log, vec![RunStateEntry::completed("T1")]);
    }

    #[test]
    fn orphans_are_recovered() {
        let mut orphan = Task::new("T1", "one");
        orphan.status = TaskStatus::InProgress;
        orphan.attempts = 1;
        let (_dir, paths, store) = setup(vec![orphan, Task::new("T2", "two")]);

        assert_eq!(recover_orphans(&store, &paths).unwrap(), vec!["T1".to_string()]);
        let doc = tasks(&store, &paths);
        assert_eq!(doc.tasks[0].status, TaskStatus::Pending);
        assert_eq!(doc.tasks[0].attempts, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut done = Task::new("T1", "one");
        done.status = TaskStatus::Completed;
        done.attempts = 2;
        done.blocked = true;
        let (_dir, paths, store) = setup(vec![done]);
        record_failure(&store, &paths, "T1", "old").unwrap();

        assert_eq!(reset_run(&store, &paths).unwrap(), 1);

        let doc = tasks(&store, &paths);
        assert_eq!(doc.tasks[0].status, TaskStatus::Pending);
        assert_eq!(doc.tasks[0].attempts, 0);
        assert!(!doc.tasks[0].blocked);
        let obstacles: ObstaclesDocument = store.read_only(&paths.obstacles).unwrap();
        assert!(obstacles.obstacles.is_empty());
        let log: Vec<RunStateEntry> = store.read_only(&paths.state).unwrap();
        assert!(log.is_empty());
    }
}
