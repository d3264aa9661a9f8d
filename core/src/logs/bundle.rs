use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::fs::{File, OpenOptions};

use crate::config::LogsConfig;
use crate::error::ConfigError;

use super::writer::{start_log_writer, LogWriterHandle, LogWriterTx};

/// Locations of the three per-run artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogPaths {
    pub stream: PathBuf,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl LogPaths {
    pub fn for_run(dir: &Path, run_id: &str) -> Self {
        Self {
            stream: dir.join(format!("run_{run_id}.stream.jsonl")),
            stdout: dir.join(format!("run_{run_id}.stdout.txt")),
            stderr: dir.join(format!("run_{run_id}.stderr.txt")),
        }
    }
}

/// Open writers for a run's full event stream, raw stdout and raw stderr.
pub struct LogBundle {
    pub paths: LogPaths,
    pub stream: LogWriterTx,
    pub stdout: LogWriterTx,
    pub stderr: LogWriterTx,
    handles: Vec<LogWriterHandle>,
}

impl LogBundle {
    /// Creates the log directory if needed and all three files up front, so
    /// they exist even when the child never writes anything.
    pub async fn create(cfg: &LogsConfig, run_id: &str) -> Result<Self, ConfigError> {
        tokio::fs::create_dir_all(&cfg.dir)
            .await
            .map_err(|source| ConfigError::LogDir {
                path: cfg.dir.clone(),
                source,
            })?;

        let paths = LogPaths::for_run(&cfg.dir, run_id);
        let mut handles = Vec::with_capacity(3);

        let (stream, h) = open_writer(&paths.stream, cfg).await?;
        handles.push(h);
        let (stdout, h) = open_writer(&paths.stdout, cfg).await?;
        handles.push(h);
        let (stderr, h) = open_writer(&paths.stderr, cfg).await?;
        handles.push(h);

        tracing::debug!(
            target: "subagent.logs",
            run_id,
            stream = %paths.stream.display(),
            stdout = %paths.stdout.display(),
            stderr = %paths.stderr.display(),
            "log bundle created"
        );

        Ok(Self {
            paths,
            stream,
            stdout,
            stderr,
            handles,
        })
    }

    pub fn dropped_chunks(&self) -> u64 {
        self.stream.dropped_count() + self.stdout.dropped_count() + self.stderr.dropped_count()
    }

    /// Drops the senders held by the bundle and waits for every writer to flush.
    pub async fn close(self, wait: Duration) -> LogPaths {
        let LogBundle {
            paths,
            stream,
            stdout,
            stderr,
            handles,
        } = self;
        drop((stream, stdout, stderr));
        for h in handles {
            h.close(wait).await;
        }
        paths
    }
}

async fn open_writer(
    path: &Path,
    cfg: &LogsConfig,
) -> Result<(LogWriterTx, LogWriterHandle), ConfigError> {
    let file = open_append(path).await.map_err(|source| ConfigError::LogDir {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(start_log_writer(file, path.to_path_buf(), cfg))
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path).await
}
