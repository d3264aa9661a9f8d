use std::io::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use subagent_core::api::{lines, LogPaths, ProgressSink, Run, SubagentResult};

const TICK: Duration = Duration::from_millis(200);

/// Spinner with notices printed above it.
///
/// Text goes to `out`; the spinner is drawn on the target made by
/// `draw_target`, which is stdout outside of tests.
pub struct InteractiveProgress<W: Write + Send> {
    out: W,
    draw_target: fn() -> ProgressDrawTarget,
    bar: Option<ProgressBar>,
}

impl InteractiveProgress<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), ProgressDrawTarget::stdout)
    }
}

impl<W: Write + Send> InteractiveProgress<W> {
    pub fn new(out: W, draw_target: fn() -> ProgressDrawTarget) -> Self {
        Self {
            out,
            draw_target,
            bar: None,
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.bar.is_some()
    }

    pub fn into_inner(self) -> W {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
        self.out
    }

    fn line(&mut self, s: &str) {
        let out = &mut self.out;
        let mut write = || {
            // best effort, like the batch sink
            let _ = writeln!(out, "{s}");
            let _ = out.flush();
        };
        match &self.bar {
            Some(pb) => pb.suspend(write),
            None => write(),
        }
    }
}

impl<W: Write + Send> ProgressSink for InteractiveProgress<W> {
    fn run_started(&mut self, run: &Run) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
        for l in lines::header(run) {
            self.line(&l);
        }

        let style = ProgressStyle::with_template("{prefix} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("|/-\\ ");
        let pb = ProgressBar::with_draw_target(None, (self.draw_target)());
        pb.set_style(style);
        pb.set_prefix(lines::spinner_prefix(&run.run_id));
        pb.enable_steady_tick(TICK);
        self.bar = Some(pb);
    }

    fn tool_used(&mut self, run_id: &str, tool: &str) {
        self.line(&lines::tool(run_id, tool));
    }

    fn agent_completed(&mut self, run_id: &str) {
        self.line(&lines::completed(run_id));
    }

    fn run_finished(&mut self, run_id: &str, result: &SubagentResult, logs: Option<&LogPaths>) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
        for l in lines::summary(run_id, result) {
            self.line(&l);
        }
        if let Some(paths) = logs {
            self.line(&lines::logs(paths));
        }
    }
}
