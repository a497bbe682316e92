// src/exec/mod.rs

//! Agent execution layer.
//!
//! The schedulers never spawn processes themselves; they talk to an
//! [`AgentInvoker`], which runs one opaque unit of work for a prompt and
//! reports its exit status and captured output.
//!
//! - [`backend`] defines the `AgentInvoker` trait and the `AgentOutput` /
//!   `AgentOutcome` types exchanged with the schedulers. Tests plug in a
//!   scripted fake here.
//! - [`command`] provides `CommandInvoker`, the production implementation
//!   that runs the configured agent CLI with `tokio::process::Command`.
//! - [`rate_limit`] classifies agent output that signals a usage limit.

pub mod backend;
pub mod command;
pub mod rate_limit;

pub use backend::{AgentInvoker, AgentOutcome, AgentOutput, InvokeFuture};
pub use command::CommandInvoker;
pub use rate_limit::{DEFAULT_RATE_LIMIT_MARKER, RateLimitDetector};
