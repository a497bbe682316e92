// src/engine/sequential.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::all_complete;
use crate::engine::summary::{Summarizer, finish};
use crate::engine::termination::{Termination, exit_condition};
use crate::errors::Result;
use crate::exec::{AgentInvoker, AgentOutcome, AgentOutput, RateLimitDetector};
use crate::prompt::PromptSource;
use crate::store::JsonStore;
use crate::tasks::{RunPaths, TasksDocument};

/// Default iteration budget for the sequential loop.
pub const DEFAULT_ITERATION_LIMIT: u32 = 20;

/// Single-worker loop bounded by an iteration limit.
///
/// Each iteration runs one agent with the iteration prompt and lets the
/// agent pick its own work from the tasks document. After every iteration
/// the loop checks, in order: the rate-limit marker, all tasks complete,
/// and an exhausted task. Running out of iterations ends the run with
/// [`Termination::IterationLimit`].
pub struct SequentialScheduler {
    paths: RunPaths,
    store: JsonStore,
    invoker: Arc<dyn AgentInvoker>,
    prompts: Arc<dyn PromptSource>,
    detector: RateLimitDetector,
    limit: u32,
}

impl fmt::Debug for SequentialScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialScheduler")
            .field("paths", &self.paths)
            .field("detector", &self.detector)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl SequentialScheduler {
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
            detector: RateLimitDetector::default(),
            limit: DEFAULT_ITERATION_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_detector(mut self, detector: RateLimitDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Run until a terminal condition, then call `summarizer` once with the
    /// reason.
    pub async fn run<S>(self, summarizer: &S) -> Result<Termination>
    where
        S: Summarizer + ?Sized,
    {
        let outcome = self.run_until_terminated().await;
        finish(summarizer, outcome).await
    }

    async fn run_until_terminated(&self) -> Result<Termination> {
        if let Some(doc) = self.read_tasks()? {
            if !doc.tasks.is_empty() && all_complete(&doc.tasks) {
                info!("all tasks already completed; nothing to do");
                return Ok(Termination::AllCompleted);
            }
        }

        info!(limit = self.limit, "sequential scheduler started");

        for iteration in 1..=self.limit {
            let prompt = self.prompts.iteration_prompt(iteration, self.limit)?;
            info!(iteration, limit = self.limit, "starting iteration");

            let output = match self.invoker.invoke(prompt).await {
                Ok(output) => output,
                Err(err) => {
                    warn!(iteration, error = %err, "agent invocation failed");
                    AgentOutput::failure(-1, err.to_string())
                }
            };

            match output.outcome(&self.detector) {
                AgentOutcome::RateLimited => {
                    warn!(iteration, "agent usage limit reached");
                    return Ok(Termination::RateLimited);
                }
                AgentOutcome::Failed(code) => {
                    warn!(iteration, exit_code = code, "iteration agent failed");
                }
                AgentOutcome::Success => {
                    debug!(iteration, "iteration agent succeeded");
                }
            }

            if let Some(doc) = self.read_tasks()? {
                if let Some(termination) = exit_condition(&doc.tasks) {
                    return Ok(termination);
                }
            }
        }

        Ok(Termination::IterationLimit(self.limit))
    }

    /// The tasks document is optional here; the agent may create it during
    /// the first iteration.
    fn read_tasks(&self) -> Result<Option<TasksDocument>> {
        if !self.paths.tasks.exists() {
            return Ok(None);
        }
        self.store.read_only(&self.paths.tasks).map(Some)
    }
}
