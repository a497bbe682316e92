// src/config/mod.rs

//! Configuration loading and validation for agentloop.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate what serde cannot check (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    AgentSection, Config, ExecuteSection, PromptsSection, RawConfig, SchedulerSection,
};
pub use validate::validate_raw_config;
