// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `agentloop`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "agentloop",
    version,
    about = "Drive coding agents through a dependency graph of tasks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Agentloop.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AGENTLOOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run agents until the project's tasks are done or a limit is hit.
    Execute {
        /// Project name (directory under the state dir).
        project: String,

        /// Dispatch every ready task concurrently, following dependencies.
        #[arg(long = "async")]
        asynchronous: bool,

        /// Iteration limit for the sequential loop.
        #[arg(long, value_name = "N")]
        limit: Option<u32>,

        /// Echo agent stdout.
        #[arg(long)]
        verbose: bool,
    },

    /// Show task status, the ready set and any terminal condition. Runs nothing.
    Status { project: String },

    /// Put every task back to pending with zero attempts and clear the logs.
    Reset { project: String },

    /// List recorded obstacles.
    Obstacles {
        project: String,

        /// Only show obstacles not yet marked resolved.
        #[arg(long)]
        unresolved: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_flags_parse() {
        let args = CliArgs::try_parse_from([
            "agentloop", "--log-level", "debug", "execute", "demo", "--async", "--limit", "4",
        ])
        .unwrap();
        match args.command {
            Command::Execute {
                project,
                asynchronous,
                limit,
                verbose,
            } => {
                assert_eq!(project, "demo");
                assert!(asynchronous);
                assert_eq!(limit, Some(4));
                assert!(!verbose);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let args =
            CliArgs::try_parse_from(["agentloop", "status", "demo", "--config", "x.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn project_is_required() {
        assert!(CliArgs::try_parse_from(["agentloop", "execute"]).is_err());
    }
}
