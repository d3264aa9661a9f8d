//! Human-facing progress output.
//!
//! The sink is an injected capability: the engine only reports what
//! happened, the implementation decides how (or whether) to render it.
//! Everything a sink prints is noise from the caller's point of view; the
//! final JSON line is written by the binary, never by a sink.
//!
//! While the agent runs, notices travel through `ProgressForwarder` to a
//! blocking thread, so rendering never sits on the coordinating loop.

mod forward;
pub mod lines;

pub use forward::{ProgressForwarder, ProgressNotice, ProgressTx};

use crate::config::Run;
use crate::logs::LogPaths;
use crate::result::SubagentResult;

pub trait ProgressSink: Send {
    fn run_started(&mut self, run: &Run);

    /// Called once per distinct tool name, and only when streaming is enabled.
    fn tool_used(&mut self, run_id: &str, tool: &str);

    /// The agent emitted its terminal event.
    fn agent_completed(&mut self, run_id: &str);

    fn run_finished(&mut self, run_id: &str, result: &SubagentResult, logs: Option<&LogPaths>);
}
