// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod prompt;
pub mod store;
pub mod tasks;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{Config, load_or_default};
use crate::dag::ready_tasks;
use crate::engine::{
    AgentSummarizer, AsyncScheduler, SequentialScheduler, Termination, exit_condition, reset_run,
};
use crate::exec::{AgentInvoker, CommandInvoker};
use crate::prompt::{PromptSource, TemplatePrompts, TemplateRenderer};
use crate::store::JsonStore;
use crate::tasks::{ObstaclesDocument, RunPaths, TasksDocument, load_tasks};
use crate::types::ExecutionMode;

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let store = JsonStore::new(cfg.lock_timeout);

    match args.command {
        Command::Execute {
            project,
            asynchronous,
            limit,
            verbose,
        } => {
            let options = ExecuteOptions {
                mode: ExecutionMode::from_flag(asynchronous || cfg.asynchronous),
                limit: limit.unwrap_or(cfg.limit),
                verbose,
            };
            let termination = execute(&cfg, &store, &project, options).await?;
            println!("{termination}");
            Ok(())
        }
        Command::Status { project } => {
            let paths = RunPaths::for_project(&cfg.state_dir, &project);
            let doc = load_tasks(&store, &paths.tasks)
                .with_context(|| format!("reading tasks for project '{project}'"))?;
            print_status(&project, &doc);
            Ok(())
        }
        Command::Reset { project } => {
            let paths = RunPaths::for_project(&cfg.state_dir, &project);
            let count = reset_run(&store, &paths)
                .with_context(|| format!("resetting project '{project}'"))?;
            info!(project = %project, tasks = count, "run state reset");
            println!("reset {count} task(s) in project '{project}'");
            Ok(())
        }
        Command::Obstacles {
            project,
            unresolved,
        } => {
            let paths = RunPaths::for_project(&cfg.state_dir, &project);
            let doc = read_obstacles(&store, &paths)?;
            print_obstacles(&doc, unresolved);
            Ok(())
        }
    }
}

/// Per-invocation settings for `execute`, after CLI overrides.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteOptions {
    pub mode: ExecutionMode,
    pub limit: u32,
    pub verbose: bool,
}

/// Run one project with the production invoker, templates and summarizer.
pub async fn execute(
    cfg: &Config,
    store: &JsonStore,
    project: &str,
    options: ExecuteOptions,
) -> Result<Termination> {
    let paths = RunPaths::for_project(&cfg.state_dir, project);

    if options.limit == 0 {
        bail!("--limit must be >= 1 (got 0)");
    }
    if !paths.tasks.exists() {
        bail!(
            "no tasks document for project '{project}' at {}",
            paths.tasks.display()
        );
    }
    let doc = load_tasks(store, &paths.tasks)
        .with_context(|| format!("loading tasks for project '{project}'"))?;
    if doc.tasks.is_empty() {
        bail!("project '{project}' has no tasks");
    }

    let templates = TemplatePrompts::new(
        TemplateRenderer::new(&cfg.prompts_dir),
        project,
        paths.clone(),
    );
    let invoker: Arc<dyn AgentInvoker> = Arc::new(
        CommandInvoker::new(&cfg.program, cfg.args.clone()).with_verbose(options.verbose),
    );
    let prompts: Arc<dyn PromptSource> = Arc::new(templates.clone());
    let summarizer = AgentSummarizer::new(templates, Arc::clone(&invoker));

    info!(
        project,
        mode = ?options.mode,
        tasks = doc.tasks.len(),
        program = %cfg.program,
        "starting execution"
    );

    let termination = match options.mode {
        ExecutionMode::Async => {
            AsyncScheduler::new(paths, store.clone(), invoker, prompts)
                .with_poll_interval(cfg.poll_interval)
                .run(&summarizer)
                .await?
        }
        ExecutionMode::Sequential => {
            SequentialScheduler::new(paths, store.clone(), invoker, prompts)
                .with_limit(options.limit)
                .with_detector(cfg.rate_limit.clone())
                .run(&summarizer)
                .await?
        }
    };

    Ok(termination)
}

fn read_obstacles(store: &JsonStore, paths: &RunPaths) -> Result<ObstaclesDocument> {
    if !paths.obstacles.exists() {
        debug!(path = %paths.obstacles.display(), "no obstacles recorded yet");
        return Ok(ObstaclesDocument::default());
    }
    let doc = store
        .read_only(&paths.obstacles)
        .with_context(|| format!("reading {}", paths.obstacles.display()))?;
    Ok(doc)
}

/// Status output: tasks, the ready set, and what would stop a run now.
fn print_status(project: &str, doc: &TasksDocument) {
    println!("agentloop status: {project}");
    println!();

    println!("tasks ({}):", doc.tasks.len());
    for task in doc.tasks.iter() {
        println!("  - {} {}", task.id, task.title);
        println!(
            "      status: {} (attempts {}/{})",
            task.status, task.attempts, task.max_attempts
        );
        if !task.dependencies.is_empty() {
            println!("      dependencies: {:?}", task.dependencies);
        }
        if task.blocked {
            println!("      blocked: true");
        }
    }
    println!();

    let ready: Vec<&str> = ready_tasks(&doc.tasks)
        .into_iter()
        .map(|t| t.id.as_str())
        .collect();
    println!("ready: {ready:?}");

    if let Some(reason) = exit_condition(&doc.tasks) {
        println!("terminal: {reason}");
    }
}

fn print_obstacles(doc: &ObstaclesDocument, unresolved_only: bool) {
    let shown: Vec<_> = doc
        .obstacles
        .iter()
        .filter(|o| !unresolved_only || !o.resolved)
        .collect();

    println!("obstacles ({}):", shown.len());
    for o in shown {
        let mark = if o.resolved { " (resolved)" } else { "" };
        println!("  - {} [{}]{mark}: {}", o.id, o.task_id, o.message);
    }
}
