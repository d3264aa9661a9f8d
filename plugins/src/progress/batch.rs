use std::io::Write;

use subagent_core::api::{lines, LogPaths, ProgressSink, Run, SubagentResult};

/// Plain lines, one per notice. Used when stdout is not a terminal.
pub struct BatchProgress<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> BatchProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, s: &str) {
        // progress is best effort; a closed pipe must not abort the run
        let _ = writeln!(self.out, "{s}");
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ProgressSink for BatchProgress<W> {
    fn run_started(&mut self, run: &Run) {
        for l in lines::header(run) {
            self.line(&l);
        }
    }

    fn tool_used(&mut self, run_id: &str, tool: &str) {
        self.line(&lines::tool(run_id, tool));
    }

    fn agent_completed(&mut self, run_id: &str) {
        self.line(&lines::completed(run_id));
    }

    fn run_finished(&mut self, run_id: &str, result: &SubagentResult, logs: Option<&LogPaths>) {
        for l in lines::summary(run_id, result) {
            self.line(&l);
        }
        if let Some(paths) = logs {
            self.line(&lines::logs(paths));
        }
    }
}
