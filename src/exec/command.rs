// src/exec/command.rs

use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::backend::{AgentInvoker, AgentOutput, InvokeFuture};

/// Production invoker: runs the agent CLI headless with the prompt as its
/// final argument, e.g. `claude --dangerously-skip-permissions --print <prompt>`.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    program: String,
    args: Vec<String>,
    verbose: bool,
}

impl CommandInvoker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            verbose: false,
        }
    }

    /// Echo agent stdout to our stdout once the agent exits.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    async fn run(&self, prompt: String) -> Result<AgentOutput> {
        info!(
            program = %self.program,
            prompt_bytes = prompt.len(),
            "starting agent process"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning agent process '{}'", self.program))?;

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for agent process '{}'", self.program))?;

        // No exit code means the process was killed by a signal.
        let exit_code = output.status.code().unwrap_or(-1);
        let result = AgentOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        info!(
            program = %self.program,
            exit_code,
            success = result.succeeded(),
            "agent process exited"
        );

        if self.verbose && !result.stdout.is_empty() {
            println!("{}", result.stdout);
        } else {
            debug!(stdout_bytes = result.stdout.len(), "agent stdout captured");
        }
        if !result.succeeded() && !result.stderr.is_empty() {
            warn!(exit_code, stderr = %result.stderr.trim_end(), "agent reported an error");
        }

        Ok(result)
    }
}

impl AgentInvoker for CommandInvoker {
    fn invoke(&self, prompt: String) -> InvokeFuture<'_> {
        Box::pin(self.run(prompt))
    }
}
