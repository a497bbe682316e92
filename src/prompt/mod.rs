// src/prompt/mod.rs

//! Prompt rendering for agent invocations.
//!
//! The schedulers only need "a prompt for task X" and "a prompt for
//! iteration N"; they get both from a [`PromptSource`]. The production
//! source renders markdown templates from a directory.

pub mod template;

use crate::errors::Result;
use crate::tasks::Task;

pub use template::{TemplatePrompts, TemplateRenderer};

/// Where schedulers get their prompts from.
pub trait PromptSource: Send + Sync {
    /// Prompt for one attempt at `task` (async scheduler).
    fn task_prompt(&self, task: &Task) -> Result<String>;

    /// Prompt for iteration `iteration` of `limit` (sequential scheduler,
    /// 1-based).
    fn iteration_prompt(&self, iteration: u32, limit: u32) -> Result<String>;
}
