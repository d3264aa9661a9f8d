use thiserror::Error;

/// Failures of the binary itself, outside a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
