// src/tasks/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{AgentloopError, Result};
use crate::tasks::model::Task;

/// Validate a task list before it is handed to a scheduler.
///
/// A task list that passes can be dispatched without hitting a missing
/// field, a dangling dependency or a dependency cycle mid-run.
pub fn validate_tasks(tasks: &[Task]) -> Result<()> {
    validate_ids(tasks)?;
    validate_budgets(tasks)?;
    validate_dependencies(tasks)?;
    validate_dag(tasks)?;
    Ok(())
}

fn validate_ids(tasks: &[Task]) -> Result<()> {
    let mut seen = HashSet::new();
    for task in tasks {
        if task.id.trim().is_empty() {
            return Err(AgentloopError::InvalidTasks(
                "task with an empty `id`".to_string(),
            ));
        }
        if !seen.insert(task.id.as_str()) {
            return Err(AgentloopError::InvalidTasks(format!(
                "duplicate task id '{}'",
                task.id
            )));
        }
    }
    Ok(())
}

fn validate_budgets(tasks: &[Task]) -> Result<()> {
    for task in tasks {
        if task.max_attempts == 0 {
            return Err(AgentloopError::InvalidTasks(format!(
                "task '{}' has max_attempts = 0 (must be >= 1)",
                task.id
            )));
        }
    }
    Ok(())
}

fn validate_dependencies(tasks: &[Task]) -> Result<()> {
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    for task in tasks {
        for dep in task.dependencies.iter() {
            if dep == &task.id {
                return Err(AgentloopError::InvalidTasks(format!(
                    "task '{}' cannot depend on itself",
                    task.id
                )));
            }
            if !ids.contains(dep.as_str()) {
                return Err(AgentloopError::InvalidTasks(format!(
                    "task '{}' has unknown dependency '{}'",
                    task.id, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(tasks: &[Task]) -> Result<()> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for task in tasks {
        graph.add_node(task.id.as_str());
    }
    for task in tasks {
        for dep in task.dependencies.iter() {
            graph.add_edge(dep.as_str(), task.id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(AgentloopError::DagCycle(format!(
            "cycle detected in task dependencies involving task '{}'",
            cycle.node_id()
        ))),
    }
}
