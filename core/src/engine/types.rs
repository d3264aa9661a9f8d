use std::collections::HashMap;

use crate::backend::BackendStrategy;
use crate::config::{AppConfig, Run};
use crate::logs::LogPaths;
use crate::progress::ProgressSink;
use crate::result::SubagentResult;
use crate::runner::Termination;
use crate::stream_event::ToolUseRecord;

pub struct RunInput<'a> {
    pub run: &'a Run,
    pub cfg: &'a AppConfig,
    /// Snapshot of the caller's environment, taken once at startup.
    pub env: &'a HashMap<String, String>,
    pub backend: &'a dyn BackendStrategy,
    /// Moved onto its own thread for the duration of the agent session.
    pub sink: Box<dyn ProgressSink>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: SubagentResult,
    /// `None` when the run failed before the log bundle was created.
    pub logs: Option<LogPaths>,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    pub termination: Option<Termination>,
    /// JSON line number of the terminal event, if one was seen.
    pub terminal_seq: Option<u64>,
    pub tools: Vec<ToolUseRecord>,
}

impl RunReport {
    pub(crate) fn failed_early(result: SubagentResult, logs: Option<LogPaths>) -> Self {
        Self {
            result,
            logs,
            pid: None,
            exit_code: None,
            termination: None,
            terminal_seq: None,
            tools: Vec::new(),
        }
    }
}
