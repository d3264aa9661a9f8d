use std::collections::HashMap;
use std::path::PathBuf;

use crate::stream_event::{TerminalEvent, ToolUseRecord};

/// Fully resolved command line for the agent process.
#[derive(Debug, Clone)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
    pub cwd: PathBuf,
}

impl RunnerStartArgs {
    /// Command line for logs. Values are not quoted and may contain the task text.
    pub fn display_cmdline(&self) -> String {
        std::iter::once(self.cmd.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What decided the end of the run. Set exactly once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A terminal `result` event was classified.
    TerminalEvent,
    /// Stdout reached EOF and the process exited (or could not be waited on).
    Exited,
    /// The wall-clock deadline elapsed first.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct RunnerResult {
    pub termination: Termination,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    pub wait_error: Option<String>,
    pub terminal: Option<TerminalEvent>,
    /// JSON line number of the terminal event.
    pub terminal_seq: Option<u64>,
    /// Message of the last `error` event seen on the stream.
    pub last_error: Option<String>,
    pub json_lines: u64,
    pub tools: Vec<ToolUseRecord>,
    pub stdout_tail: String,
    pub stderr_tail: String,
    pub duration_ms: u64,
}
