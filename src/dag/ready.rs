// src/dag/ready.rs

use std::collections::HashSet;

use crate::tasks::Task;
use crate::types::TaskStatus;

/// Ids of all tasks whose status is `completed`.
pub fn completed_ids(tasks: &[Task]) -> HashSet<&str> {
    tasks
        .iter()
        .filter(|t| t.is_completed())
        .map(|t| t.id.as_str())
        .collect()
}

/// Tasks that may be dispatched now, in input order.
///
/// A task is ready iff:
/// - `status == pending`
/// - it is not `blocked`
/// - `attempts < max_attempts`
/// - every dependency is a task with `status == completed`
///
/// A dependency id that names no task in the list is never satisfied.
pub fn ready_tasks(tasks: &[Task]) -> Vec<&Task> {
    let completed = completed_ids(tasks);

    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Pending)
        .filter(|t| !t.blocked)
        .filter(|t| t.attempts < t.max_attempts)
        .filter(|t| {
            t.dependencies
                .iter()
                .all(|dep| completed.contains(dep.as_str()))
        })
        .collect()
}

/// Every task is `completed`. Vacuously true for an empty list.
pub fn all_complete(tasks: &[Task]) -> bool {
    tasks.iter().all(|t| t.is_completed())
}

/// The first task (in list order) that used up its retry budget without
/// completing.
pub fn first_exhausted(tasks: &[Task]) -> Option<&Task> {
    tasks.iter().find(|t| t.is_exhausted())
}
