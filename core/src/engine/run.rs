use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::backend::BackendStrategy;
use crate::config::{child_env, AppConfig, Credentials, Run};
use crate::error::{ConfigError, RunnerError};
use crate::logs::LogBundle;
use crate::progress::{ProgressForwarder, ProgressTx};
use crate::result::{assemble, SubagentResult};
use crate::runner::{run_session, RunSessionArgs, RunnerResult};

use super::types::{RunInput, RunReport};

const LOG_CLOSE_WAIT: Duration = Duration::from_secs(2);

// Larger stdout captures are not re-read for the single-document fallback.
const SINGLE_DOCUMENT_MAX_BYTES: u64 = 16 * 1024 * 1024;

/// Runs one sub-agent invocation end to end.
///
/// Never fails: configuration problems, launch failures, timeouts and
/// crashes all end up in `RunReport::result`.
pub async fn run_subagent(input: RunInput<'_>) -> RunReport {
    let RunInput {
        run,
        cfg,
        env,
        backend,
        mut sink,
    } = input;

    sink.run_started(run);

    let (report, sink) = match prepare(run, cfg, env) {
        Ok(child_envs) => {
            let forwarder = ProgressForwarder::start(sink);
            let report = execute(run, cfg, backend, child_envs, forwarder.tx()).await;
            let wait = Duration::from_millis(cfg.control.progress_wait_ms);
            (report, forwarder.finish(wait).await)
        }
        Err(e) => {
            tracing::error!(
                target: "subagent.engine",
                run_id = %run.run_id,
                error = %e,
                "run rejected before launch"
            );
            (RunReport::failed_early(SubagentResult::from_error(&e), None), Some(sink))
        }
    };

    if let Some(mut sink) = sink {
        sink.run_finished(&run.run_id, &report.result, report.logs.as_ref());
    }

    tracing::debug!(
        target: "subagent.engine",
        run_id = %run.run_id,
        success = report.result.success,
        error = report.result.error.as_deref().unwrap_or(""),
        "run finished"
    );

    report
}

/// Checks that must pass before anything touches the filesystem or spawns.
fn prepare(
    run: &Run,
    cfg: &AppConfig,
    env: &HashMap<String, String>,
) -> Result<HashMap<String, String>, ConfigError> {
    let creds = Credentials::resolve(env, &cfg.backend)?;
    if !run.cwd.is_dir() {
        return Err(ConfigError::InvalidWorkingDir(run.cwd.clone()));
    }
    tracing::debug!(target: "subagent.engine", ?creds, "credentials resolved");
    Ok(child_env(env, &creds, &cfg.backend))
}

async fn execute(
    run: &Run,
    cfg: &AppConfig,
    backend: &dyn BackendStrategy,
    child_envs: HashMap<String, String>,
    progress: &ProgressTx,
) -> RunReport {
    let logs = match LogBundle::create(&cfg.logs, &run.run_id).await {
        Ok(logs) => logs,
        Err(e) => {
            tracing::error!(target: "subagent.engine", error = %e, "log bundle unavailable");
            return RunReport::failed_early(SubagentResult::from_error(&e), None);
        }
    };

    let plan = match backend.plan(run, child_envs, cfg) {
        Ok(plan) => plan,
        Err(e) => {
            let err = RunnerError::Plan(e);
            let paths = logs.close(LOG_CLOSE_WAIT).await;
            return RunReport::failed_early(SubagentResult::from_error(&err), Some(paths));
        }
    };

    tracing::info!(
        target: "subagent.engine",
        run_id = %run.run_id,
        backend = backend.name(),
        cwd = %run.cwd.display(),
        timeout_secs = run.timeout.as_secs(),
        stream = run.stream,
        "launching agent"
    );
    tracing::debug!(
        target: "subagent.engine",
        run_id = %run.run_id,
        cmd = %plan.session_args.display_cmdline(),
        "agent command line"
    );

    let outcome = run_session(RunSessionArgs {
        run,
        start: &plan.session_args,
        control: &cfg.control,
        logs: &logs,
        progress,
    })
    .await;

    let dropped = logs.dropped_chunks();
    if dropped > 0 {
        tracing::warn!(target: "subagent.engine", dropped, "log chunks dropped during run");
    }
    let paths = logs.close(LOG_CLOSE_WAIT).await;

    match outcome {
        Ok(outcome) => {
            let stdout_full = if needs_full_stdout(&outcome, cfg.control.capture_bytes) {
                read_capture(&paths.stdout).await
            } else {
                None
            };
            RunReport {
                result: assemble(&outcome, run.timeout, stdout_full.as_deref()),
                logs: Some(paths),
                pid: outcome.pid,
                exit_code: outcome.exit_code,
                termination: Some(outcome.termination),
                terminal_seq: outcome.terminal_seq,
                tools: outcome.tools,
            }
        }
        Err(e) => {
            tracing::error!(
                target: "subagent.engine",
                run_id = %run.run_id,
                kind = e.kind(),
                error = %e,
                "agent could not be started"
            );
            RunReport::failed_early(SubagentResult::from_error(&e), Some(paths))
        }
    }
}

/// Clean exit without a terminal event, and the tail ring may have cut the output.
fn needs_full_stdout(outcome: &RunnerResult, capture_bytes: usize) -> bool {
    outcome.terminal.is_none()
        && outcome.exit_code == Some(0)
        && outcome.stdout_tail.len() >= capture_bytes
}

async fn read_capture(path: &Path) -> Option<String> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    if meta.len() > SINGLE_DOCUMENT_MAX_BYTES {
        tracing::warn!(
            target: "subagent.engine",
            bytes = meta.len(),
            "stdout capture too large to parse as one document"
        );
        return None;
    }
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            tracing::warn!(target: "subagent.engine", error = %e, "cannot re-read stdout capture");
            None
        }
    }
}
