use std::time::Duration;

use serde_json::Value;

use crate::runner::{RunnerResult, Termination};
use crate::util::{preview, tail_lines};

use super::model::SubagentResult;

const STDERR_TAIL_LINES: usize = 20;
const STDERR_TAIL_CHARS: usize = 2000;

/// Turns a finished session into the single result document.
///
/// `stdout_full` is the whole stdout capture when the caller has it; the
/// single-document fallback uses it instead of the bounded tail ring.
pub fn assemble(outcome: &RunnerResult, timeout: Duration, stdout_full: Option<&str>) -> SubagentResult {
    if outcome.termination == Termination::TimedOut {
        return SubagentResult::failure(format!("timed out after {} seconds", timeout.as_secs()));
    }

    if let Some(t) = &outcome.terminal {
        if t.success {
            return SubagentResult::success(t.result.clone().unwrap_or_default());
        }
        let msg = t
            .error
            .clone()
            .or_else(|| t.result.clone())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "agent reported failure".to_string());
        return SubagentResult::failure(msg);
    }

    if let Some(e) = &outcome.wait_error {
        return SubagentResult::failure(e.clone());
    }

    match outcome.exit_code {
        Some(0) => match single_document_result(stdout_full.unwrap_or(&outcome.stdout_tail)) {
            Some(text) => SubagentResult::success(text),
            None => match &outcome.last_error {
                Some(e) => SubagentResult::failure(format!("no structured result produced: {e}")),
                None => SubagentResult::failure("no structured result produced"),
            },
        },
        Some(code) => {
            let stderr = preview(&tail_lines(&outcome.stderr_tail, STDERR_TAIL_LINES), STDERR_TAIL_CHARS);
            let detail = if !stderr.is_empty() {
                Some(stderr)
            } else {
                outcome.last_error.clone()
            };
            match detail {
                Some(d) => SubagentResult::failure(format!("agent exited with code {code}: {d}")),
                None => SubagentResult::failure(format!("agent exited with code {code}")),
            }
        }
        None => SubagentResult::failure("agent exited without status"),
    }
}

/// `--output-format json` prints one document; accept it when no line
/// was recognised as a terminal event.
fn single_document_result(stdout: &str) -> Option<String> {
    let v: Value = serde_json::from_str(stdout.trim()).ok()?;
    if v.get("is_error").and_then(Value::as_bool) == Some(true) {
        return None;
    }
    v.get("result").and_then(Value::as_str).map(str::to_string)
}
