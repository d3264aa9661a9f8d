use std::collections::HashMap;
use std::time::Duration;

use subagent_core::api as core_api;
use subagent_core::error::CliError;
use subagent_plugins::factory;

use crate::commands::cli::Args;

/// Resolves the invocation into an immutable `Run`.
pub fn build_run(args: &Args) -> Result<core_api::Run, CliError> {
    let cwd = match &args.cwd {
        Some(p) => p.clone(),
        None => std::env::current_dir()?,
    };

    Ok(core_api::Run::new(args.task.clone(), cwd, Duration::from_secs(args.timeout))
        .with_stream(args.stream)
        .with_debug(args.debug)
        .with_max_budget_usd(args.max_budget)
        .with_allowed_tools(core_api::parse_allowed_tools(args.allowed_tools.as_deref())))
}

/// Drives one run to a report with the default backend and progress sink.
pub async fn run_app(
    run: &core_api::Run,
    cfg: &core_api::AppConfig,
    env: &HashMap<String, String>,
) -> core_api::RunReport {
    let backend = factory::build_backend();

    core_api::run_subagent(core_api::RunInput {
        run,
        cfg,
        env,
        backend: backend.as_ref(),
        sink: factory::build_progress_sink(),
    })
    .await
}

/// Config from defaults and environment, then CLI overrides.
pub fn build_config(args: &Args, env: &HashMap<String, String>) -> core_api::AppConfig {
    let mut cfg = core_api::load_from_env(env);
    if let Some(bin) = args.agent_bin.as_deref().filter(|b| !b.trim().is_empty()) {
        cfg.backend.bin = bin.to_string();
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn run_carries_flags_from_arguments() {
        let args = Args::try_parse_from([
            "subagent",
            "--task",
            "list files",
            "--cwd",
            "/work",
            "--timeout",
            "30",
            "--debug",
            "--allowed-tools",
            "Bash, Read",
        ])
        .unwrap();

        let run = build_run(&args).unwrap();
        assert!(run.debug);
        assert!(!run.stream);
        assert_eq!(run.cwd, PathBuf::from("/work"));
        assert_eq!(run.timeout, Duration::from_secs(30));
        assert_eq!(run.allowed_tools, vec!["Bash".to_string(), "Read".to_string()]);
    }

    #[test]
    fn missing_cwd_defaults_to_current_dir() {
        let args = Args::try_parse_from(["subagent", "--task", "t"]).unwrap();
        let run = build_run(&args).unwrap();
        assert!(!run.debug);
        assert_eq!(run.cwd, std::env::current_dir().unwrap());
    }

    #[test]
    fn agent_bin_argument_overrides_environment() {
        let args = Args::try_parse_from(["subagent", "--task", "t", "--agent-bin", "/opt/claude"]).unwrap();
        let mut env = HashMap::new();
        env.insert("SUBAGENT_AGENT_BIN".to_string(), "/usr/bin/other".to_string());
        assert_eq!(build_config(&args, &env).backend.bin, "/opt/claude");
    }
}
