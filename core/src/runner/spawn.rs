use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::error::RunnerError;

use super::types::RunnerStartArgs;

/// Starts the agent with piped stdio and closes its stdin right away.
///
/// The agent waits for input on an open stdin and never exits, so the pipe
/// must be closed before anything else happens.
pub fn spawn(args: &RunnerStartArgs) -> Result<Child, RunnerError> {
    let mut cmd = Command::new(&args.cmd);
    cmd.args(&args.args)
        .current_dir(&args.cwd)
        .env_clear()
        .envs(&args.envs)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group so the whole tree can be signalled on timeout.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            RunnerError::CliNotFound {
                program: args.cmd.clone(),
            }
        } else {
            RunnerError::Spawn {
                program: args.cmd.clone(),
                source,
            }
        }
    })?;

    drop(child.stdin.take());

    tracing::debug!(
        target: "subagent.runner",
        pid = child.id(),
        program = %args.cmd,
        "agent spawned, stdin closed"
    );

    Ok(child)
}
