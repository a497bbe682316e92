// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentloopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The advisory lock guarding a shared document could not be acquired
    /// in time. Fatal for the operation that asked for it.
    #[error("timed out after {waited:?} waiting for lock on {path:?}")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("Invalid tasks document: {0}")]
    InvalidTasks(String),

    #[error("Cycle detected in task dependencies: {0}")]
    DagCycle(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AgentloopError>;
