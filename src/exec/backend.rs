// src/exec/backend.rs

//! Pluggable agent backend abstraction.
//!
//! The schedulers hold an `Arc<dyn AgentInvoker>`; each dispatched task gets
//! its own Tokio task that awaits `invoke` and hands the result back through
//! its `JoinHandle`.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::rate_limit::RateLimitDetector;

/// Boxed future returned by [`AgentInvoker::invoke`].
pub type InvokeFuture<'a> = Pin<Box<dyn Future<Output = Result<AgentOutput>> + Send + 'a>>;

/// Runs one unit of agent work for a prompt.
///
/// Production code uses [`CommandInvoker`](crate::exec::CommandInvoker);
/// tests provide implementations that never spawn a process.
///
/// An `Err` means the invocation itself broke (e.g. the binary could not be
/// spawned). Schedulers treat it exactly like a non-zero exit.
pub trait AgentInvoker: Send + Sync {
    fn invoke(&self, prompt: String) -> InvokeFuture<'_>;
}

/// Raw result of one agent invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl AgentOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Classify this output. A usage-limit signal wins over the exit code.
    pub fn outcome(&self, detector: &RateLimitDetector) -> AgentOutcome {
        if detector.matches(&self.stdout) {
            AgentOutcome::RateLimited
        } else if self.succeeded() {
            AgentOutcome::Success
        } else {
            AgentOutcome::Failed(self.exit_code)
        }
    }
}

/// Structured view of an [`AgentOutput`] used for scheduling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOutcome {
    Success,
    Failed(i32),
    /// The agent refused work because its usage limit was reached; nothing
    /// further can succeed in this run.
    RateLimited,
}
