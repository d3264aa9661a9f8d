use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Claude CLI not found ({program}). Install: npm install -g @anthropic-ai/claude-code")]
    CliNotFound { program: String },

    #[error("failed to spawn process: {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("backend planning failed: {0}")]
    Plan(#[source] anyhow::Error),
}

impl RunnerError {
    /// Short stable tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RunnerError::CliNotFound { .. } => "cli_not_found",
            RunnerError::Spawn { .. } => "spawn",
            RunnerError::Wait(_) => "wait",
            RunnerError::Plan(_) => "plan",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_not_found_message_names_the_cause() {
        let e = RunnerError::CliNotFound {
            program: "claude".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Claude CLI not found"));
        assert!(msg.contains("claude"));
        assert_eq!(e.kind(), "cli_not_found");
    }

    #[test]
    fn wait_errors_carry_the_io_cause() {
        let e = RunnerError::Wait(std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted"));
        assert_eq!(e.to_string(), "failed to wait for process: interrupted");
        assert_eq!(e.kind(), "wait");
    }
}
