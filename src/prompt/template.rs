// src/prompt/template.rs

use std::fs;
use std::path::PathBuf;

use crate::errors::{AgentloopError, Result};
use crate::prompt::PromptSource;
use crate::tasks::{RunPaths, Task};

/// Renders `<dir>/<name>.md` by substituting `{{KEY}}` placeholders.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    dir: PathBuf,
}

impl TemplateRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let path = self.dir.join(format!("{name}.md"));
        let template = fs::read_to_string(&path).map_err(|e| {
            AgentloopError::ConfigError(format!(
                "cannot read prompt template {}: {e}",
                path.display()
            ))
        })?;
        Ok(substitute(&template, vars))
    }
}

fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}", key = key), value)
    })
}

/// Template-backed [`PromptSource`] for one project.
///
/// Templates used: `execute_task` (per task), `execute` (per iteration) and
/// `summarise` (end of run, see [`AgentSummarizer`](crate::engine::AgentSummarizer)).
///
/// Every template can use `PROJECT_NAME`, `PROJECT_DIR`, `TASKS_PATH`,
/// `STATE_PATH` and `OBSTACLES_PATH`; the paths are the ones the scheduler
/// itself reads, so agents and scheduler always agree on the documents.
#[derive(Debug, Clone)]
pub struct TemplatePrompts {
    renderer: TemplateRenderer,
    project: String,
    paths: RunPaths,
}

impl TemplatePrompts {
    pub fn new(renderer: TemplateRenderer, project: impl Into<String>, paths: RunPaths) -> Self {
        Self {
            renderer,
            project: project.into(),
            paths,
        }
    }

    pub fn summary_prompt(&self, exit_reason: &str) -> Result<String> {
        self.render("summarise", &[("EXIT_REASON", exit_reason)])
    }

    fn render(&self, name: &str, extra: &[(&str, &str)]) -> Result<String> {
        let project_dir = self
            .paths
            .tasks
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let tasks = self.paths.tasks.display().to_string();
        let state = self.paths.state.display().to_string();
        let obstacles = self.paths.obstacles.display().to_string();

        let mut vars: Vec<(&str, &str)> = vec![
            ("PROJECT_NAME", self.project.as_str()),
            ("PROJECT_DIR", project_dir.as_str()),
            ("TASKS_PATH", tasks.as_str()),
            ("STATE_PATH", state.as_str()),
            ("OBSTACLES_PATH", obstacles.as_str()),
        ];
        vars.extend_from_slice(extra);
        self.renderer.render(name, &vars)
    }
}

impl PromptSource for TemplatePrompts {
    fn task_prompt(&self, task: &Task) -> Result<String> {
        self.render(
            "execute_task",
            &[
                ("TASK_ID", task.id.as_str()),
                ("TASK_TITLE", task.title.as_str()),
                ("TASK_DESCRIPTION", task.description.as_str()),
            ],
        )
    }

    fn iteration_prompt(&self, iteration: u32, limit: u32) -> Result<String> {
        self.render(
            "execute",
            &[
                ("ITERATION_NUM", iteration.to_string().as_str()),
                ("MAX_ITERATIONS", limit.to_string().as_str()),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn substitutes_every_occurrence() {
        let out = substitute("{{A}} and {{A}} but not {{B}}", &[("A", "x")]);
        assert_eq!(out, "x and x but not {{B}}");
    }

    #[test]
    fn renders_task_prompt_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("execute_task.md"),
            "Project {{PROJECT_NAME}}: do {{TASK_ID}} ({{TASK_TITLE}})",
        )
        .unwrap();
        let prompts = TemplatePrompts::new(
            TemplateRenderer::new(dir.path()),
            "demo",
            RunPaths::in_dir(dir.path().join("demo")),
        );

        let out = prompts.task_prompt(&Task::new("T1", "Write parser")).unwrap();
        assert_eq!(out, "Project demo: do T1 (Write parser)");
    }

    #[test]
    fn missing_template_is_config_error() {
        let dir = TempDir::new().unwrap();
        let prompts = TemplatePrompts::new(
            TemplateRenderer::new(dir.path()),
            "demo",
            RunPaths::in_dir(dir.path().join("demo")),
        );
        assert!(matches!(
            prompts.iteration_prompt(1, 5),
            Err(AgentloopError::ConfigError(_))
        ));
    }

    #[test]
    fn prompts_point_at_the_configured_state_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("execute.md"),
            "{{ITERATION_NUM}}/{{MAX_ITERATIONS}} edit {{TASKS_PATH}}",
        )
        .unwrap();
        fs::write(
            dir.path().join("summarise.md"),
            "{{EXIT_REASON}} -> {{PROJECT_DIR}} {{STATE_PATH}} {{OBSTACLES_PATH}}",
        )
        .unwrap();
        let state_dir = dir.path().join("custom-state");
        let paths = RunPaths::for_project(&state_dir, "demo");
        let prompts =
            TemplatePrompts::new(TemplateRenderer::new(dir.path()), "demo", paths.clone());

        let iteration = prompts.iteration_prompt(2, 9).unwrap();
        assert_eq!(iteration, format!("2/9 edit {}", paths.tasks.display()));
        assert!(!iteration.contains(".agentloop"));

        let summary = prompts.summary_prompt("done").unwrap();
        assert_eq!(
            summary,
            format!(
                "done -> {} {} {}",
                state_dir.join("demo").display(),
                paths.state.display(),
                paths.obstacles.display()
            )
        );
    }
}
