use std::path::PathBuf;

use clap::Parser;

/// Run a code CLI agent as a one-shot sub-agent and print one JSON result.
#[derive(Parser, Debug, Clone)]
#[command(name = "subagent", version)]
pub struct Args {
    /// Task description handed to the agent.
    #[arg(long)]
    pub task: String,

    /// Working directory for the agent (default: current directory).
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Wall-clock timeout in seconds.
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Show tool names as the agent uses them.
    #[arg(long, default_value_t = false)]
    pub stream: bool,

    /// Cost ceiling in USD passed to the agent.
    #[arg(long)]
    pub max_budget: Option<f64>,

    /// Comma-separated tool names the agent may use.
    #[arg(long)]
    pub allowed_tools: Option<String>,

    /// Append debug traces to the debug log file.
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Agent executable (defaults to `claude` or SUBAGENT_AGENT_BIN).
    #[arg(long)]
    pub agent_bin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_surface() {
        let args = Args::try_parse_from(["subagent", "--task", "list files"]).unwrap();
        assert_eq!(args.task, "list files");
        assert_eq!(args.timeout, 120);
        assert!(!args.stream);
        assert!(!args.debug);
        assert!(args.cwd.is_none());
        assert!(args.max_budget.is_none());
    }

    #[test]
    fn all_flags_parse() {
        let args = Args::try_parse_from([
            "subagent",
            "--task",
            "t",
            "--cwd",
            "/work",
            "--timeout",
            "5",
            "--stream",
            "--max-budget",
            "0.5",
            "--allowed-tools",
            "Read,Edit",
            "--debug",
            "--agent-bin",
            "/opt/claude",
        ])
        .unwrap();
        assert_eq!(args.cwd, Some(PathBuf::from("/work")));
        assert_eq!(args.timeout, 5);
        assert!(args.stream && args.debug);
        assert_eq!(args.max_budget, Some(0.5));
        assert_eq!(args.allowed_tools.as_deref(), Some("Read,Edit"));
        assert_eq!(args.agent_bin.as_deref(), Some("/opt/claude"));
    }

    #[test]
    fn task_is_required_and_timeout_positive() {
        assert!(Args::try_parse_from(["subagent"]).is_err());
        assert!(Args::try_parse_from(["subagent", "--task", "t", "--timeout", "0"]).is_err());
    }
}
