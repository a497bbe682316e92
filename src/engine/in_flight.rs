// src/engine/in_flight.rs

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::errors::Result;
use crate::exec::AgentOutput;

/// Handle for one running agent attempt.
#[derive(Debug)]
pub struct Worker {
    pub attempt: u32,
    pub started: Instant,
    pub handle: JoinHandle<Result<AgentOutput>>,
}

impl Worker {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Map from task id to its running agent.
///
/// **At most one entry per task id.** An entry is removed exactly once, by
/// [`take_finished`](Self::take_finished), when its attempt is about to be
/// reconciled; until then the task is never dispatched again.
#[derive(Debug, Default)]
pub struct InFlight {
    workers: BTreeMap<String, Worker>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.workers.contains_key(task_id)
    }

    pub fn ids(&self) -> HashSet<&str> {
        self.workers.keys().map(|k| k.as_str()).collect()
    }

    /// Track a freshly spawned worker.
    ///
    /// Returns `false` if `task_id` is already tracked; the rejected worker
    /// is dropped, which detaches it.
    pub fn insert(&mut self, task_id: String, worker: Worker) -> bool {
        if self.workers.contains_key(&task_id) {
            return false;
        }
        self.workers.insert(task_id, worker);
        true
    }

    /// Remove and return every worker whose agent has finished, in task id
    /// order.
    pub fn take_finished(&mut self) -> Vec<(String, Worker)> {
        let done: Vec<String> = self
            .workers
            .iter()
            .filter(|(_, w)| w.handle.is_finished())
            .map(|(id, _)| id.clone())
            .collect();

        done.into_iter()
            .filter_map(|id| self.workers.remove(&id).map(|w| (id, w)))
            .collect()
    }

    /// Stop tracking all workers without waiting for or cancelling them.
    ///
    /// Dropping a `JoinHandle` detaches its task, so the agents keep running
    /// until they exit or the runtime shuts down. At shutdown the runtime
    /// drops the detached futures, and the invoker's `kill_on_drop` child
    /// handles kill any agent process still alive. Returns the ids that
    /// were still running.
    pub fn abandon(&mut self) -> Vec<String> {
        std::mem::take(&mut self.workers).into_keys().collect()
    }
}
