// src/engine/summary.rs

//! End-of-run summarize hook.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::engine::termination::Termination;
use crate::errors::Result;
use crate::exec::AgentInvoker;
use crate::prompt::TemplatePrompts;

/// Boxed future returned by [`Summarizer::summarize`].
pub type SummaryFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Called exactly once when a scheduler loop stops, with the
/// human-readable termination reason.
pub trait Summarizer: Send + Sync {
    fn summarize<'a>(&'a self, reason: &'a str) -> SummaryFuture<'a>;
}

/// Production summarizer: renders the `summarise` template with the exit
/// reason and runs one agent to write the project summary.
pub struct AgentSummarizer {
    prompts: TemplatePrompts,
    invoker: Arc<dyn AgentInvoker>,
}

impl AgentSummarizer {
    pub fn new(prompts: TemplatePrompts, invoker: Arc<dyn AgentInvoker>) -> Self {
        Self { prompts, invoker }
    }
}

impl Summarizer for AgentSummarizer {
    fn summarize<'a>(&'a self, reason: &'a str) -> SummaryFuture<'a> {
        Box::pin(async move {
            info!(reason, "summary agent started");
            let prompt = self.prompts.summary_prompt(reason)?;
            let output = self.invoker.invoke(prompt).await?;
            if output.succeeded() {
                info!("execution summary is ready");
            } else {
                warn!(exit_code = output.exit_code, "summary agent failed");
            }
            Ok(())
        })
    }
}

/// Turn the loop's result into the final outcome, invoking `summarizer`
/// once on every path.
///
/// An error from the loop is summarized as [`Termination::Aborted`] and then
/// returned unchanged. A failing summarizer is logged; it never changes
/// the outcome.
pub async fn finish<S>(summarizer: &S, outcome: Result<Termination>) -> Result<Termination>
where
    S: Summarizer + ?Sized,
{
    let (termination, result) = match outcome {
        Ok(t) => (t.clone(), Ok(t)),
        Err(err) => {
            error!(error = %err, "scheduler loop failed");
            (Termination::Aborted(err.to_string()), Err(err))
        }
    };

    let reason = termination.to_string();
    info!(reason = %reason, "scheduler terminated");
    if let Err(err) = summarizer.summarize(&reason).await {
        warn!(error = %err, "summarize hook failed");
    }

    result
}
