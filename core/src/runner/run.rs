use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{ControlConfig, Run};
use crate::error::RunnerError;
use crate::logs::LogBundle;
use crate::progress::{ProgressNotice, ProgressTx};
use crate::stream_event::{StreamEvent, StreamJsonEventParser, TerminalEvent, ToolUseTracker};
use crate::util::RingBytes;

use super::exit::exit_code_of;
use super::shutdown::shutdown;
use super::spawn::spawn;
use super::tee::pump;
use super::types::{RunnerResult, RunnerStartArgs, Termination};

pub struct RunSessionArgs<'a> {
    pub run: &'a Run,
    pub start: &'a RunnerStartArgs,
    pub control: &'a ControlConfig,
    pub logs: &'a LogBundle,
    pub progress: &'a ProgressTx,
}

/// Runs the agent to completion, timeout or crash.
///
/// The deadline and the read/wait loop race on one cancellation token: the
/// deadline task cancels it when time is up, the loop cancels it when it is
/// done. Whoever gets there first decides the `Termination`, exactly once.
pub async fn run_session(args: RunSessionArgs<'_>) -> Result<RunnerResult, RunnerError> {
    let RunSessionArgs {
        run,
        start,
        control,
        logs,
        progress,
    } = args;

    let started = Instant::now();
    let mut child = spawn(start)?;
    let pid = child.id();

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let ring_out = RingBytes::new(control.capture_bytes);
    let ring_err = RingBytes::new(control.capture_bytes);
    let drain_cancel = CancellationToken::new();

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let mut pumps = Vec::with_capacity(2);
    if let Some(out) = stdout {
        pumps.push(pump(
            out,
            ring_out.clone(),
            logs.stdout.clone(),
            Some(line_tx),
            drain_cancel.clone(),
            "stdout",
        ));
    } else {
        drop(line_tx);
    }
    if let Some(err) = stderr {
        pumps.push(pump(
            err,
            ring_err.clone(),
            logs.stderr.clone(),
            None,
            drain_cancel.clone(),
            "stderr",
        ));
    }

    let deadline = CancellationToken::new();
    let deadline_task = {
        let token = deadline.clone();
        let timeout = run.timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => token.cancel(),
            }
        })
    };

    let mut parser = StreamJsonEventParser::new();
    let mut tracker = ToolUseTracker::new();
    let mut terminal: Option<(u64, TerminalEvent)> = None;
    let mut last_error: Option<String> = None;
    let mut exit_status: Option<ExitStatus> = None;
    let mut wait_error: Option<String> = None;

    let termination = {
        let wait_fut = child.wait();
        tokio::pin!(wait_fut);

        let mut stdout_open = true;
        let mut exited_at: Option<Instant> = None;
        let drain_grace = Duration::from_millis(control.drain_grace_ms);

        let termination = loop {
            // Once the child is gone, stdout only gets a short grace to hit EOF
            // (a detached grandchild may still hold the pipe).
            let exited = exited_at;
            let drain_wait = async move {
                match exited {
                    Some(t) => tokio::time::sleep_until((t + drain_grace).into()).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;

                _ = deadline.cancelled() => break Termination::TimedOut,

                line = line_rx.recv(), if stdout_open => match line {
                    Some(line) => {
                        if classify(
                            &line,
                            run,
                            logs,
                            progress,
                            &mut parser,
                            &mut tracker,
                            &mut terminal,
                            &mut last_error,
                        )
                        .await
                        {
                            break Termination::TerminalEvent;
                        }
                    }
                    None => {
                        stdout_open = false;
                        if exited_at.is_some() {
                            break Termination::Exited;
                        }
                    }
                },

                res = &mut wait_fut, if exited_at.is_none() => {
                    match res {
                        Ok(status) => exit_status = Some(status),
                        Err(e) => {
                            let err = RunnerError::Wait(e);
                            tracing::error!(target: "subagent.runner", kind = err.kind(), error = %err, "wait on agent failed");
                            wait_error = Some(err.to_string());
                        }
                    }
                    if !stdout_open || wait_error.is_some() {
                        break Termination::Exited;
                    }
                    exited_at = Some(Instant::now());
                }

                _ = drain_wait => {
                    tracing::debug!(target: "subagent.runner", "stdout still open after exit, stop reading");
                    break Termination::Exited;
                }
            }
        };

        // A terminal event decides the result, but the child may still be
        // flushing; let it exit on its own within the remaining time.
        if termination == Termination::TerminalEvent && exit_status.is_none() && wait_error.is_none() {
            let remaining = run.timeout.saturating_sub(started.elapsed());
            let grace = Duration::from_millis(control.post_result_grace_ms).min(remaining);
            if let Ok(res) = tokio::time::timeout(grace, &mut wait_fut).await {
                match res {
                    Ok(status) => exit_status = Some(status),
                    Err(e) => wait_error = Some(RunnerError::Wait(e).to_string()),
                }
            }
        }

        termination
    };

    // Stop the deadline task (no-op if it already fired).
    deadline.cancel();
    let _ = deadline_task.await;
    // No more classification; the pump keeps draining into the raw log.
    drop(line_rx);

    if exit_status.is_none() && wait_error.is_none() {
        if termination == Termination::TimedOut {
            tracing::warn!(
                target: "subagent.runner",
                run_id = %run.run_id,
                timeout_secs = run.timeout.as_secs(),
                "agent timed out, terminating"
            );
        }
        exit_status = shutdown(&mut child, pid, control).await;
    }

    let drain_grace = Duration::from_millis(control.drain_grace_ms);
    let all_pumps = join_pumps(pumps);
    tokio::pin!(all_pumps);
    if tokio::time::timeout(drain_grace, &mut all_pumps).await.is_err() {
        tracing::debug!(target: "subagent.runner", "pipes still open after drain grace, cancelling pumps");
        drain_cancel.cancel();
        // Kill whatever still holds the pipes open.
        let _ = shutdown(&mut child, pid, control).await;
        let _ = tokio::time::timeout(drain_grace, &mut all_pumps).await;
    }

    let exit_code = exit_status.map(exit_code_of);
    let duration_ms = started.elapsed().as_millis() as u64;

    tracing::info!(
        target: "subagent.runner",
        run_id = %run.run_id,
        ?termination,
        ?exit_code,
        json_lines = parser.json_lines(),
        tools = tracker.len(),
        duration_ms,
        "agent session finished"
    );

    let (terminal_seq, terminal) = match terminal {
        Some((seq, t)) => (Some(seq), Some(t)),
        None => (None, None),
    };

    Ok(RunnerResult {
        termination,
        pid,
        exit_code,
        wait_error,
        terminal,
        terminal_seq,
        last_error,
        json_lines: parser.json_lines(),
        tools: tracker.records().to_vec(),
        stdout_tail: ring_out.to_string_lossy(),
        stderr_tail: ring_err.to_string_lossy(),
        duration_ms,
    })
}

/// Classifies one stdout line. Returns true when a terminal event was seen.
async fn classify(
    line: &str,
    run: &Run,
    logs: &LogBundle,
    progress: &ProgressTx,
    parser: &mut StreamJsonEventParser,
    tracker: &mut ToolUseTracker,
    terminal: &mut Option<(u64, TerminalEvent)>,
    last_error: &mut Option<String>,
) -> bool {
    let events = parser.parse_sequenced(line);
    if events.is_empty() {
        return false;
    }
    logs.stream.send_line(line).await;

    for ev in events {
        match ev.event {
            StreamEvent::ToolUse { name, .. } => {
                let first = tracker.observe(&name);
                tracing::debug!(target: "subagent.stream", seq = ev.seq, tool = %name, first, "tool use");
                if first && run.stream {
                    progress.send(ProgressNotice::ToolUsed {
                        run_id: run.run_id.clone(),
                        tool: name,
                    });
                }
            }
            StreamEvent::ToolResult { tool_use_id, is_error } => {
                tracing::trace!(target: "subagent.stream", seq = ev.seq, ?tool_use_id, ?is_error, "tool result");
            }
            StreamEvent::Terminal(t) => {
                tracing::debug!(target: "subagent.stream", seq = ev.seq, success = t.success, "terminal event");
                if run.stream {
                    progress.send(ProgressNotice::AgentCompleted {
                        run_id: run.run_id.clone(),
                    });
                }
                *terminal = Some((ev.seq, t));
                return true;
            }
            StreamEvent::Error { message } => {
                tracing::warn!(target: "subagent.stream", seq = ev.seq, %message, "agent error event");
                *last_error = Some(message);
            }
            StreamEvent::Unknown => {
                tracing::trace!(target: "subagent.stream", seq = ev.seq, "unclassified event");
            }
        }
    }
    false
}

async fn join_pumps(handles: Vec<tokio::task::JoinHandle<u64>>) {
    for h in handles {
        let _ = h.await;
    }
}
