// src/config/validate.rs

use crate::config::model::{Config, RawConfig};
use crate::errors::{AgentloopError, Result};
use crate::exec::RateLimitDetector;

impl TryFrom<RawConfig> for Config {
    type Error = AgentloopError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let detector =
            RateLimitDetector::from_config(&raw.agent.rate_limit_marker, raw.agent.rate_limit_is_regex)?;
        Ok(Config::new_unchecked(raw, detector))
    }
}

/// Check the invariants serde cannot express.
pub fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_execute(cfg)?;
    validate_agent(cfg)?;
    Ok(())
}

fn validate_scheduler(cfg: &RawConfig) -> Result<()> {
    if cfg.scheduler.poll_interval_ms == 0 {
        return Err(AgentloopError::ConfigError(
            "[scheduler].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.scheduler.lock_timeout_secs == 0 {
        return Err(AgentloopError::ConfigError(
            "[scheduler].lock_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.scheduler.state_dir.as_os_str().is_empty() {
        return Err(AgentloopError::ConfigError(
            "[scheduler].state_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_execute(cfg: &RawConfig) -> Result<()> {
    if cfg.execute.limit == 0 {
        return Err(AgentloopError::ConfigError(
            "[execute].limit must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_agent(cfg: &RawConfig) -> Result<()> {
    if cfg.agent.program.trim().is_empty() {
        return Err(AgentloopError::ConfigError(
            "[agent].program must not be empty".to_string(),
        ));
    }
    Ok(())
}
