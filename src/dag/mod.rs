// src/dag/mod.rs

//! Pure evaluation of the task dependency graph.
//!
//! Everything here works on a snapshot of the task list and performs no IO,
//! so the schedulers can call it on whatever they last read from the store.
//!
//! - [`ready`] decides which tasks may be dispatched now and whether the run
//!   has reached a terminal condition.

pub mod ready;

pub use ready::{all_complete, completed_ids, first_exhausted, ready_tasks};
