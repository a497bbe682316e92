// src/logging.rs

//! Logging setup for `agentloop` using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level`, then `AGENTLOOP_LOG`, then `info`.
//! Logs go to STDERR; STDOUT carries command output and, with
//! `--verbose`, agent output.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is not given.
pub const LOG_ENV_VAR: &str = "AGENTLOOP_LOG";

/// Install the global subscriber. Call once, before the first command runs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = cli_level
        .map(Level::from)
        .or_else(|| std::env::var(LOG_ENV_VAR).ok().and_then(|s| level_from_env(&s)))
        .unwrap_or(Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Level named by an `AGENTLOOP_LOG` value; unknown values are ignored.
fn level_from_env(value: &str) -> Option<Level> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_value_names_a_level() {
        assert_eq!(level_from_env(" Debug "), Some(Level::DEBUG));
        assert_eq!(level_from_env("WARN"), Some(Level::WARN));
        assert_eq!(level_from_env("loud"), None);
        assert_eq!(level_from_env(""), None);
    }

    #[test]
    fn cli_levels_map_onto_tracing_levels() {
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
    }
}
