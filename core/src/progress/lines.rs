//! Wording shared by every progress sink.

use crate::config::Run;
use crate::logs::LogPaths;
use crate::result::SubagentResult;
use crate::util::preview;

const PREFIX: &str = "[subagent]";

pub fn header(run: &Run) -> [String; 2] {
    [
        format!("{PREFIX} {} starting cwd={}", run.run_id, run.cwd.display()),
        format!("{PREFIX} task: {}", preview(&run.task, 120)),
    ]
}

pub fn tool(run_id: &str, tool: &str) -> String {
    format!("{PREFIX} {run_id} tool: {tool}")
}

pub fn completed(run_id: &str) -> String {
    format!("{PREFIX} {run_id} complete")
}

pub fn spinner_prefix(run_id: &str) -> String {
    format!("{PREFIX} {run_id} running")
}

pub fn summary(run_id: &str, result: &SubagentResult) -> Vec<String> {
    if result.success {
        vec![
            format!("{PREFIX} {run_id} success"),
            format!(
                "{PREFIX} result: {}",
                preview(result.result.as_deref().unwrap_or_default(), 200)
            ),
        ]
    } else {
        vec![format!(
            "{PREFIX} {run_id} error={}",
            result.error.as_deref().unwrap_or("unknown error")
        )]
    }
}

pub fn logs(paths: &LogPaths) -> String {
    format!(
        "{PREFIX} logs: {} {} {}",
        paths.stream.display(),
        paths.stdout.display(),
        paths.stderr.display()
    )
}
