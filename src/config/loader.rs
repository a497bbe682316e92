// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{Config, RawConfig};
use crate::errors::{AgentloopError, Result};

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = load_from_path(&path)?;
    let config = Config::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration for a run.
///
/// - `Some(path)`: the file must exist.
/// - `None`: use [`default_config_path`] if present, built-in defaults
///   otherwise.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(AgentloopError::ConfigError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            load_and_validate(path)
        }
        None => {
            let path = default_config_path();
            if path.exists() {
                load_and_validate(&path)
            } else {
                debug!(path = %path.display(), "no config file; using defaults");
                Ok(Config::default())
            }
        }
    }
}

/// `Agentloop.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Agentloop.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_or_default(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, AgentloopError::ConfigError(msg) if msg.contains("not found")));
    }

    #[test]
    fn explicit_file_is_loaded_and_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Agentloop.toml");
        fs::write(&path, "[execute]\nlimit = 7\n").unwrap();

        let cfg = load_or_default(Some(path.as_path())).unwrap();
        assert_eq!(cfg.limit, 7);
    }

    #[test]
    fn malformed_toml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[execute\n").unwrap();

        assert!(matches!(
            load_and_validate(&path),
            Err(AgentloopError::TomlError(_))
        ));
    }
}
