use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API token: set ANTHROPIC_AUTH_TOKEN or ZAI_API_KEY")]
    MissingCredential,

    #[error("working directory is not a directory: {}", .0.display())]
    InvalidWorkingDir(PathBuf),

    #[error("cannot prepare log directory {}: {source}", path.display())]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
