// src/engine/async_loop.rs

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::dag::ready_tasks;
use crate::engine::in_flight::{InFlight, Worker};
use crate::engine::summary::{Summarizer, finish};
use crate::engine::termination::{Termination, exit_condition_excluding};
use crate::engine::transitions::{mark_dispatched, record_failure, record_success, recover_orphans};
use crate::errors::{AgentloopError, Result};
use crate::exec::{AgentInvoker, AgentOutput};
use crate::prompt::PromptSource;
use crate::store::JsonStore;
use crate::tasks::{RunPaths, Task, TasksDocument};

/// Default delay between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Dependency-driven scheduler that runs one agent per ready task,
/// concurrently.
///
/// Each poll cycle, in this order:
/// 1. reconcile every worker that finished since the last cycle
/// 2. check for termination (all complete / a task exhausted)
/// 3. dispatch every ready task that is not already in flight
/// 4. sleep for the poll interval
///
/// The control loop is the only place that computes ready tasks and changes
/// task state; workers just run the agent and return its output. Every
/// state change goes through the store's locked read-modify-write, run on
/// the blocking pool so a lock wait never stalls the runtime.
pub struct AsyncScheduler {
    paths: RunPaths,
    store: JsonStore,
    invoker: Arc<dyn AgentInvoker>,
    prompts: Arc<dyn PromptSource>,
    poll_interval: Duration,
}

impl fmt::Debug for AsyncScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncScheduler")
            .field("paths", &self.paths)
            .field("store", &self.store)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl AsyncScheduler {
    pub fn new(
        paths: RunPaths,
        store: JsonStore,
        invoker: Arc<dyn AgentInvoker>,
        prompts: Arc<dyn PromptSource>,
    ) -> Self {
        Self {
            paths,
            store,
            invoker,
            prompts,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until a terminal condition, then call `summarizer` once with the
    /// reason.
    ///
    /// Agents still running at termination are abandoned, not cancelled.
    pub async fn run<S>(self, summarizer: &S) -> Result<Termination>
    where
        S: Summarizer + ?Sized,
    {
        let mut in_flight = InFlight::new();
        let outcome = self.run_until_terminated(&mut in_flight).await;

        let abandoned = in_flight.abandon();
        if !abandoned.is_empty() {
            warn!(?abandoned, "leaving agents running after termination");
        }

        finish(summarizer, outcome).await
    }

    async fn run_until_terminated(&self, in_flight: &mut InFlight) -> Result<Termination> {
        self.blocking(|store, paths| paths.ensure_logs(store)).await?;

        let orphans = self.blocking(recover_orphans).await?;
        if !orphans.is_empty() {
            warn!(?orphans, "reset tasks left in_progress by an earlier run");
        }

        info!(
            tasks = %self.paths.tasks.display(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "async scheduler started"
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;

            self.reconcile(in_flight).await?;

            // Unlocked read: every mutation this loop cares about was
            // committed by `reconcile` above.
            let doc: TasksDocument = self
                .blocking(|store, paths| store.read_only(&paths.tasks))
                .await?;

            if let Some(termination) = exit_condition_excluding(&doc.tasks, &in_flight.ids()) {
                return Ok(termination);
            }

            let dispatched = self.dispatch(&doc.tasks, in_flight).await?;

            if in_flight.is_empty() && dispatched == 0 {
                let waiting: Vec<String> = doc
                    .tasks
                    .iter()
                    .filter(|t| !t.is_completed())
                    .map(|t| t.id.clone())
                    .collect();
                return Ok(Termination::Stalled { waiting });
            }

            debug!(cycle, dispatched, in_flight = in_flight.len(), "poll cycle finished");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Step 1: fold every finished worker's result into the shared state.
    async fn reconcile(&self, in_flight: &mut InFlight) -> Result<()> {
        for (task_id, worker) in in_flight.take_finished() {
            let attempt = worker.attempt;
            let elapsed = worker.elapsed();

            let failure = match worker.handle.await {
                Ok(Ok(output)) if output.succeeded() => None,
                Ok(Ok(output)) => Some(failure_message(&task_id, &output)),
                Ok(Err(err)) => Some(format!("Agent for task {task_id} raised an error: {err}")),
                Err(join_err) => Some(format!("Agent for task {task_id} crashed: {join_err}")),
            };

            match failure {
                None => {
                    let id = task_id.clone();
                    self.blocking(move |store, paths| record_success(store, paths, &id))
                        .await?;
                    info!(
                        task = %task_id,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "task completed"
                    );
                }
                Some(message) => {
                    let id = task_id.clone();
                    let msg = message.clone();
                    let obstacle = self
                        .blocking(move |store, paths| record_failure(store, paths, &id, &msg))
                        .await?;
                    warn!(
                        task = %task_id,
                        attempt,
                        %obstacle,
                        %message,
                        "task attempt failed"
                    );
                }
            }
        }
        Ok(())
    }

    /// Step 3: claim and start every ready task that is not in flight.
    async fn dispatch(&self, tasks: &[Task], in_flight: &mut InFlight) -> Result<usize> {
        let mut dispatched = 0;

        for task in ready_tasks(tasks) {
            if in_flight.contains(&task.id) {
                continue;
            }

            let prompt = self.prompts.task_prompt(task)?;
            let id = task.id.clone();
            let claimed = self
                .blocking(move |store, paths| mark_dispatched(store, paths, &id))
                .await?;
            let Some(attempt) = claimed else {
                continue;
            };

            let invoker = Arc::clone(&self.invoker);
            let handle = tokio::spawn(async move { invoker.invoke(prompt).await });

            info!(
                task = %task.id,
                title = %task.title,
                attempt,
                max_attempts = task.max_attempts,
                "dispatched agent"
            );

            in_flight.insert(
                task.id.clone(),
                Worker {
                    attempt,
                    started: Instant::now(),
                    handle,
                },
            );
            dispatched += 1;
        }

        Ok(dispatched)
    }

    /// Run a store operation on Tokio's blocking pool.
    ///
    /// Store calls may sleep while waiting for a document lock (up to the
    /// lock timeout), which must not freeze the thread driving the workers.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&JsonStore, &RunPaths) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        let paths = self.paths.clone();
        tokio::task::spawn_blocking(move || op(&store, &paths))
            .await
            .map_err(|e| AgentloopError::Other(anyhow::Error::from(e)))?
    }
}

fn failure_message(task_id: &str, output: &AgentOutput) -> String {
    let stderr = output.stderr.trim();
    if stderr.is_empty() {
        format!(
            "Agent for task {task_id} failed with returncode {}.",
            output.exit_code
        )
    } else {
        format!(
            "Agent for task {task_id} failed with returncode {}: {stderr}",
            output.exit_code
        )
    }
}
