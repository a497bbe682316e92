#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentloop::engine::{Summarizer, SummaryFuture};
use agentloop::errors::{AgentloopError, Result};
use agentloop::exec::{AgentInvoker, AgentOutput, InvokeFuture};
use agentloop::prompt::PromptSource;
use agentloop::tasks::Task;

/// One scripted agent run.
#[derive(Debug, Clone)]
pub struct Step {
    pub exit_code: i32,
    pub stdout: String,
    pub delay: Duration,
    /// Return an error instead of an output (invocation itself failed).
    pub error: Option<String>,
}

impl Step {
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
            delay: Duration::ZERO,
            error: None,
        }
    }

    pub fn fail(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Self::success()
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::success()
        }
    }

    pub fn stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Hook = Arc<dyn Fn(&str) + Send + Sync>;

/// A fake agent invoker that:
/// - records every prompt it was invoked with, in order
/// - plays back scripted [`Step`]s per prompt (falling back to a default)
/// - tracks the highest number of simultaneously running invocations
pub struct FakeInvoker {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    default: Step,
    calls: Arc<Mutex<Vec<String>>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    on_invoke: Option<Hook>,
}

impl FakeInvoker {
    /// Every invocation succeeds immediately unless scripted otherwise.
    pub fn succeeding() -> Self {
        Self::with_default(Step::success())
    }

    pub fn failing(exit_code: i32) -> Self {
        Self::with_default(Step::fail(exit_code))
    }

    pub fn with_default(default: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default,
            calls: Arc::new(Mutex::new(Vec::new())),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            on_invoke: None,
        }
    }

    /// Play `steps` (in order) for invocations with exactly this prompt.
    pub fn script(self, prompt: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(prompt.to_string(), steps.into());
        self
    }

    /// Run `hook` with the prompt before each invocation completes, e.g. to
    /// edit the tasks document the way a real agent would.
    pub fn on_invoke(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_invoke = Some(Arc::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prompt: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == prompt).count()
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    fn next_step(&self, prompt: &str) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        scripts
            .get_mut(prompt)
            .and_then(|steps| steps.pop_front())
            .unwrap_or_else(|| self.default.clone())
    }
}

impl AgentInvoker for FakeInvoker {
    fn invoke(&self, prompt: String) -> InvokeFuture<'_> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(prompt.clone());
            let step = self.next_step(&prompt);

            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);

            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }
            if let Some(hook) = &self.on_invoke {
                hook(&prompt);
            }

            self.running.fetch_sub(1, Ordering::SeqCst);

            match step.error {
                Some(message) => Err(AgentloopError::Other(anyhow::anyhow!(message))),
                None => Ok(AgentOutput {
                    exit_code: step.exit_code,
                    stdout: step.stdout,
                    stderr: String::new(),
                }),
            }
        })
    }
}

/// Prompt source whose task prompt is just the task id and whose iteration
/// prompt is `iteration <n>/<limit>`, so fakes can script by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdPrompts;

impl PromptSource for IdPrompts {
    fn task_prompt(&self, task: &Task) -> Result<String> {
        Ok(task.id.clone())
    }

    fn iteration_prompt(&self, iteration: u32, limit: u32) -> Result<String> {
        Ok(format!("iteration {iteration}/{limit}"))
    }
}

/// Summarizer that records every reason it is called with.
#[derive(Default)]
pub struct RecordingSummarizer {
    reasons: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the reason, then report an error.
    pub fn failing() -> Self {
        Self {
            reasons: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().unwrap().clone()
    }
}

impl Summarizer for RecordingSummarizer {
    fn summarize<'a>(&'a self, reason: &'a str) -> SummaryFuture<'a> {
        Box::pin(async move {
            self.reasons.lock().unwrap().push(reason.to_string());
            if self.fail {
                return Err(AgentloopError::Other(anyhow::anyhow!("summary agent failed")));
            }
            Ok(())
        })
    }
}
