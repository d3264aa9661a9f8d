use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

use crate::config::ControlConfig;

#[cfg(unix)]
fn signal_group(pid: u32, sig: libc::c_int) {
    // The child leads its own process group (see `spawn`), so -pid reaches
    // every descendant that did not move out of it.
    let ret = unsafe { libc::kill(-(pid as libc::pid_t), sig) };
    if ret != 0 {
        tracing::debug!(
            target: "subagent.runner",
            pid,
            sig,
            error = %std::io::Error::last_os_error(),
            "signal to process group failed"
        );
    }
}

/// Graceful stop: SIGTERM to the group, wait, then SIGKILL.
///
/// Returns the exit status if the child could be reaped.
pub async fn shutdown(child: &mut Child, pid: Option<u32>, control: &ControlConfig) -> Option<ExitStatus> {
    if let Ok(Some(status)) = child.try_wait() {
        #[cfg(unix)]
        if let Some(pid) = pid {
            // Leader is gone; make sure stragglers holding our pipes go too.
            signal_group(pid, libc::SIGKILL);
        }
        return Some(status);
    }

    #[cfg(unix)]
    if let Some(pid) = pid {
        tracing::debug!(target: "subagent.runner", pid, "sending SIGTERM to agent process group");
        signal_group(pid, libc::SIGTERM);
    }
    #[cfg(not(unix))]
    let _ = pid;

    let grace = Duration::from_millis(control.terminate_grace_ms);
    if let Ok(Ok(status)) = tokio::time::timeout(grace, child.wait()).await {
        return Some(status);
    }

    tracing::warn!(target: "subagent.runner", ?pid, "agent ignored SIGTERM, killing");
    #[cfg(unix)]
    if let Some(pid) = pid {
        signal_group(pid, libc::SIGKILL);
    }
    let _ = child.start_kill();

    let wait = Duration::from_millis(control.kill_wait_ms);
    match tokio::time::timeout(wait, child.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(e)) => {
            tracing::warn!(target: "subagent.runner", ?pid, error = %e, "wait after kill failed");
            None
        }
        Err(_) => {
            tracing::warn!(target: "subagent.runner", ?pid, "agent not reaped after kill");
            None
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    fn sh(script: &str) -> Child {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .kill_on_drop(true);
        cmd.spawn().unwrap()
    }

    #[tokio::test]
    async fn sigterm_stops_a_sleeping_child() {
        let mut child = sh("sleep 30");
        let pid = child.id();
        let started = std::time::Instant::now();

        let status = shutdown(&mut child, pid, &ControlConfig::default()).await;

        assert!(status.is_some());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn sigkill_follows_when_sigterm_is_ignored() {
        let mut child = sh("trap '' TERM; while true; do sleep 1; done");
        let pid = child.id();
        // Let the shell install its trap.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let control = ControlConfig {
            terminate_grace_ms: 300,
            ..ControlConfig::default()
        };

        let status = shutdown(&mut child, pid, &control).await;

        let status = status.expect("child should be reaped after SIGKILL");
        assert!(!status.success());
    }

    #[tokio::test]
    async fn already_exited_child_returns_its_status() {
        let mut child = sh("exit 3");
        let pid = child.id();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let status = shutdown(&mut child, pid, &ControlConfig::default()).await.unwrap();
        assert_eq!(status.code(), Some(3));
    }
}
