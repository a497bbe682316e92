// src/tasks/mod.rs

//! Typed model of the three shared documents and their on-disk layout.
//!
//! - [`model`] defines `Task`, the run-state log entries and obstacles.
//! - [`validate`] checks a tasks document before any dispatch happens
//!   (unique ids, known dependencies, acyclic graph).
//! - [`layout`] resolves where a project's documents live.

pub mod layout;
pub mod model;
pub mod validate;

use std::path::Path;

use crate::errors::Result;
use crate::store::JsonStore;

pub use layout::RunPaths;
pub use model::{
    DEFAULT_MAX_ATTEMPTS, Obstacle, ObstaclesDocument, RunStateEntry, Task, TasksDocument,
};
pub use validate::validate_tasks;

/// Read the tasks document at `path` and validate it.
///
/// This is the entry point used before a run starts; the schedulers then
/// re-read the document through the store on every cycle.
pub fn load_tasks(store: &JsonStore, path: &Path) -> Result<TasksDocument> {
    let doc: TasksDocument = store.read_only(path)?;
    validate_tasks(&doc.tasks)?;
    Ok(doc)
}
