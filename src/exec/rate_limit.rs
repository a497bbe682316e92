// src/exec/rate_limit.rs

use regex::Regex;

use crate::errors::{AgentloopError, Result};

/// Text the agent CLI prints when its usage limit has been reached.
pub const DEFAULT_RATE_LIMIT_MARKER: &str = "You've hit your limit";

/// Recognises the usage-limit signal in agent stdout.
///
/// This is the only place that looks at agent output text; everything
/// downstream branches on [`AgentOutcome::RateLimited`](crate::exec::AgentOutcome).
#[derive(Debug, Clone)]
pub enum RateLimitDetector {
    /// Plain substring match.
    Literal(String),
    /// Regular expression searched anywhere in stdout.
    Pattern(Regex),
}

impl Default for RateLimitDetector {
    fn default() -> Self {
        RateLimitDetector::Literal(DEFAULT_RATE_LIMIT_MARKER.to_string())
    }
}

impl RateLimitDetector {
    /// Build a detector from the `[agent]` config values.
    pub fn from_config(marker: &str, is_regex: bool) -> Result<Self> {
        if is_regex {
            let re = Regex::new(marker).map_err(|e| {
                AgentloopError::ConfigError(format!(
                    "[agent].rate_limit_marker is not a valid regex: {e}"
                ))
            })?;
            Ok(RateLimitDetector::Pattern(re))
        } else {
            Ok(RateLimitDetector::Literal(marker.to_string()))
        }
    }

    pub fn matches(&self, stdout: &str) -> bool {
        match self {
            RateLimitDetector::Literal(marker) => !marker.is_empty() && stdout.contains(marker),
            RateLimitDetector::Pattern(re) => re.is_match(stdout),
        }
    }
}
