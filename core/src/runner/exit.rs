use std::process::ExitStatus;

/// Shell-style exit code: the process's own code, or `128 + signal` when
/// a signal ended it (143 after SIGTERM, 137 after SIGKILL).
pub fn exit_code_of(status: ExitStatus) -> i32 {
    match (status.code(), terminating_signal(&status)) {
        (Some(code), _) => code,
        (None, Some(sig)) => 128 + sig,
        (None, None) => 1,
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    std::os::unix::process::ExitStatusExt::signal(status)
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
