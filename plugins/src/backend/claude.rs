use std::collections::HashMap;

use anyhow::{bail, Result};

use subagent_core::api as core_api;

const SUBAGENT_PROMPT: &str = "You are a coding sub-agent. Complete the given task efficiently.
Guidelines:
- Read existing files before modifying them
- Use Edit tool for surgical changes to existing files
- Use Write tool only for new files
- Follow existing project conventions
- When done, provide a clear summary of what you accomplished";

/// Headless `claude -p` invocation.
pub struct ClaudeBackendStrategy;

impl core_api::BackendStrategy for ClaudeBackendStrategy {
    fn name(&self) -> &str {
        "claude"
    }

    fn plan(
        &self,
        run: &core_api::Run,
        envs: HashMap<String, String>,
        cfg: &core_api::AppConfig,
    ) -> Result<core_api::BackendPlan> {
        if run.task.trim().is_empty() {
            bail!("task is empty");
        }
        let bin = cfg.backend.bin.trim();
        if bin.is_empty() {
            bail!("agent executable is not configured");
        }

        tracing::debug!(
            run_id = %run.run_id,
            bin,
            stream = run.stream,
            allowed_tools = ?run.allowed_tools,
            max_budget_usd = ?run.max_budget_usd,
            "planning claude backend"
        );

        let output_format = if run.stream { "stream-json" } else { "json" };
        let mut args: Vec<String> = vec![
            "-p".to_string(),
            run.task.clone(),
            "--output-format".to_string(),
            output_format.to_string(),
        ];

        // stream-json is rejected by the CLI in print mode without --verbose
        if run.stream {
            args.push("--verbose".to_string());
        }

        args.push("--dangerously-skip-permissions".to_string());
        if !run.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(run.allowed_tools.join(","));
        }

        args.push("--append-system-prompt".to_string());
        args.push(SUBAGENT_PROMPT.to_string());
        args.push("--no-session-persistence".to_string());

        if let Some(budget) = run.max_budget_usd {
            args.push("--max-budget-usd".to_string());
            args.push(budget.to_string());
        }

        Ok(core_api::BackendPlan {
            session_args: core_api::RunnerStartArgs {
                cmd: bin.to_string(),
                args,
                envs,
                cwd: run.cwd.clone(),
            },
        })
    }
}
