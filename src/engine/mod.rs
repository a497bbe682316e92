// src/engine/mod.rs

//! Scheduling engine for agentloop.
//!
//! Two loops share one set of termination rules and one summarize hook:
//! - [`async_loop`]: dependency-driven, one agent per ready task, run
//!   concurrently; bounded by retry budgets.
//! - [`sequential`]: one agent per iteration; bounded by an iteration limit
//!   and the agent's rate-limit marker.
//!
//! State changes for the async loop live in [`transitions`]; the pure exit
//! checks live in [`termination`].

pub mod async_loop;
pub mod in_flight;
pub mod sequential;
pub mod summary;
pub mod termination;
pub mod transitions;

pub use async_loop::{AsyncScheduler, DEFAULT_POLL_INTERVAL};
pub use in_flight::{InFlight, Worker};
pub use sequential::{DEFAULT_ITERATION_LIMIT, SequentialScheduler};
pub use summary::{AgentSummarizer, Summarizer, SummaryFuture, finish};
pub use termination::{Termination, exit_condition, exit_condition_excluding};
pub use transitions::{mark_dispatched, record_failure, record_success, recover_orphans, reset_run};
