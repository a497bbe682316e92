// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::{DEFAULT_RATE_LIMIT_MARKER, RateLimitDetector};

/// Configuration as read from `Agentloop.toml`, before validation.
///
/// ```toml
/// [scheduler]
/// poll_interval_ms = 2000
/// lock_timeout_secs = 30
/// state_dir = ".agentloop"
///
/// [execute]
/// limit = 20
/// asynchronous = false
///
/// [agent]
/// program = "claude"
/// args = ["--dangerously-skip-permissions", "--print"]
/// rate_limit_marker = "You've hit your limit"
///
/// [prompts]
/// dir = "templates"
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub execute: ExecuteSection,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub prompts: PromptsSection,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    /// Delay between async poll cycles.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a store operation waits for a document lock.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    /// Root under which each project keeps its documents.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_lock_timeout_secs() -> u64 {
    30
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".agentloop")
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            lock_timeout_secs: default_lock_timeout_secs(),
            state_dir: default_state_dir(),
        }
    }
}

/// `[execute]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecuteSection {
    /// Iteration budget of the sequential loop.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Use the dependency-driven async loop instead of the sequential one.
    #[serde(default)]
    pub asynchronous: bool,
}

fn default_limit() -> u32 {
    20
}

impl Default for ExecuteSection {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            asynchronous: false,
        }
    }
}

/// `[agent]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the prompt, which is always the last argument.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Text in agent stdout that means the usage limit was reached.
    #[serde(default = "default_rate_limit_marker")]
    pub rate_limit_marker: String,

    /// Treat `rate_limit_marker` as a regular expression.
    #[serde(default)]
    pub rate_limit_is_regex: bool,
}

fn default_program() -> String {
    "claude".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "--dangerously-skip-permissions".to_string(),
        "--print".to_string(),
    ]
}

fn default_rate_limit_marker() -> String {
    DEFAULT_RATE_LIMIT_MARKER.to_string()
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            rate_limit_marker: default_rate_limit_marker(),
            rate_limit_is_regex: false,
        }
    }
}

/// `[prompts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptsSection {
    /// Directory holding `execute.md`, `execute_task.md` and `summarise.md`.
    #[serde(default = "default_prompts_dir")]
    pub dir: PathBuf,
}

fn default_prompts_dir() -> PathBuf {
    PathBuf::from("templates")
}

impl Default for PromptsSection {
    fn default() -> Self {
        Self {
            dir: default_prompts_dir(),
        }
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfig>` (or `Default`), so every
/// instance has passed validation.
#[derive(Debug, Clone)]
pub struct Config {
    pub poll_interval: Duration,
    pub lock_timeout: Duration,
    pub state_dir: PathBuf,
    pub limit: u32,
    pub asynchronous: bool,
    pub program: String,
    pub args: Vec<String>,
    pub rate_limit: RateLimitDetector,
    pub prompts_dir: PathBuf,
}

impl Config {
    pub(crate) fn new_unchecked(raw: RawConfig, rate_limit: RateLimitDetector) -> Self {
        Self {
            poll_interval: Duration::from_millis(raw.scheduler.poll_interval_ms),
            lock_timeout: Duration::from_secs(raw.scheduler.lock_timeout_secs),
            state_dir: raw.scheduler.state_dir,
            limit: raw.execute.limit,
            asynchronous: raw.execute.asynchronous,
            program: raw.agent.program,
            args: raw.agent.args,
            rate_limit,
            prompts_dir: raw.prompts.dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new_unchecked(RawConfig::default(), RateLimitDetector::default())
    }
}
