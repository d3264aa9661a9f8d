use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::LogsConfig;

/// Sending half of an append-only log file.
///
/// Writes go through a channel to a dedicated task, so a slow disk never
/// stalls the caller and a failing disk never aborts the run.
#[derive(Clone)]
pub struct LogWriterTx {
    tx: mpsc::Sender<Vec<u8>>,
    dropped: Arc<AtomicU64>,
    drop_when_full: bool,
}

impl LogWriterTx {
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub async fn send(&self, bytes: Vec<u8>) {
        if self.drop_when_full {
            if self.tx.try_send(bytes).is_err() {
                let count = self.dropped.fetch_add(1, Ordering::Relaxed);
                if count % 100 == 0 {
                    tracing::warn!(
                        target: "subagent.logs",
                        dropped_total = count,
                        "log channel full, chunks are being dropped"
                    );
                }
            }
        } else if self.tx.send(bytes).await.is_err() {
            tracing::debug!(target: "subagent.logs", "log writer closed, send failed");
        }
    }

    pub async fn send_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        if !bytes.ends_with(b"\n") {
            bytes.push(b'\n');
        }
        self.send(bytes).await;
    }
}

/// Handle that owns the writer task; `close` flushes and joins it.
pub struct LogWriterHandle {
    path: PathBuf,
    task: JoinHandle<()>,
}

impl LogWriterHandle {
    pub async fn close(self, wait: Duration) {
        let path = self.path;
        let mut task = self.task;
        if tokio::time::timeout(wait, &mut task).await.is_err() {
            tracing::warn!(
                target: "subagent.logs",
                path = %path.display(),
                "log writer did not finish in time"
            );
            task.abort();
        }
    }
}

/// Spawns the writer task for an already opened log file.
pub fn start_log_writer<W>(file: W, path: PathBuf, cfg: &LogsConfig) -> (LogWriterTx, LogWriterHandle)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(cfg.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));

    let task_path = path.clone();
    let task = tokio::spawn(async move {
        let mut file = file;
        let mut write_count = 0usize;

        while let Some(chunk) = rx.recv().await {
            if let Err(e) = write_chunk(&mut file, &chunk).await {
                tracing::warn!(
                    target: "subagent.logs",
                    path = %task_path.display(),
                    error = %e,
                    bytes = chunk.len(),
                    "log write failed twice, chunk dropped"
                );
                continue;
            }
            write_count += 1;
            if write_count % 10 == 0 {
                let _ = file.flush().await;
            }
        }

        if let Err(e) = file.flush().await {
            tracing::warn!(
                target: "subagent.logs",
                path = %task_path.display(),
                error = %e,
                "failed to flush log file"
            );
        }
        tracing::debug!(
            target: "subagent.logs",
            path = %task_path.display(),
            writes = write_count,
            "log writer finished"
        );
    });

    (
        LogWriterTx {
            tx,
            dropped,
            drop_when_full: cfg.drop_when_full,
        },
        LogWriterHandle { path, task },
    )
}

/// Writes `chunk` fully, resuming after what already landed.
///
/// One failed write is retried; a second failure gives up on the chunk.
async fn write_chunk<W>(w: &mut W, chunk: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0usize;
    let mut retried = false;
    while written < chunk.len() {
        match w.write(&chunk[written..]).await {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if !retried => {
                tracing::debug!(target: "subagent.logs", error = %e, written, "log write failed, retrying");
                retried = true;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use tokio::fs::File;

    enum Step {
        Fail,
        /// Accept at most this many bytes of the buffer.
        Partial(usize),
    }

    /// In-memory writer that follows a script of failures, then accepts everything.
    #[derive(Clone, Default)]
    struct ScriptedWriter {
        data: Arc<Mutex<Vec<u8>>>,
        steps: Arc<Mutex<VecDeque<Step>>>,
    }

    impl ScriptedWriter {
        fn with_steps(steps: Vec<Step>) -> Self {
            Self {
                data: Arc::default(),
                steps: Arc::new(Mutex::new(steps.into())),
            }
        }

        fn contents(&self) -> String {
            String::from_utf8(self.data.lock().unwrap().clone()).unwrap()
        }
    }

    impl AsyncWrite for ScriptedWriter {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            let step = self.steps.lock().unwrap().pop_front();
            let n = match step {
                Some(Step::Fail) => return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "disk full"))),
                Some(Step::Partial(n)) => n.min(buf.len()),
                None => buf.len(),
            };
            self.data.lock().unwrap().extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn write_all_through(writer: ScriptedWriter, chunks: &[&str]) -> String {
        let (tx, handle) = start_log_writer(writer.clone(), PathBuf::from("mem.log"), &LogsConfig::default());
        for c in chunks {
            tx.send(c.as_bytes().to_vec()).await;
        }
        drop(tx);
        handle.close(Duration::from_secs(2)).await;
        writer.contents()
    }

    #[tokio::test]
    async fn single_failure_is_retried() {
        let writer = ScriptedWriter::with_steps(vec![Step::Fail]);
        let out = write_all_through(writer, &["one\n", "two\n"]).await;
        assert_eq!(out, "one\ntwo\n");
    }

    #[tokio::test]
    async fn second_failure_drops_only_that_chunk() {
        let writer = ScriptedWriter::with_steps(vec![Step::Fail, Step::Fail]);
        let out = write_all_through(writer, &["lost\n", "kept\n", "also kept\n"]).await;
        assert_eq!(out, "kept\nalso kept\n");
    }

    #[tokio::test]
    async fn retry_after_partial_write_does_not_duplicate() {
        let writer = ScriptedWriter::with_steps(vec![Step::Partial(3), Step::Fail]);
        let out = write_all_through(writer, &["abcdef\n"]).await;
        assert_eq!(out, "abcdef\n");
    }

    #[tokio::test]
    async fn lines_are_appended_in_order_and_flushed_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let file = File::create(&path).await.unwrap();

        let (tx, handle) = start_log_writer(file, path.clone(), &LogsConfig::default());
        tx.send_line("first").await;
        tx.send(b"second\n".to_vec()).await;
        tx.send_line("third\n").await;
        drop(tx);
        handle.close(Duration::from_secs(2)).await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\nthird\n");
    }

    #[tokio::test]
    async fn drop_when_full_counts_dropped_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let file = File::create(&path).await.unwrap();
        let cfg = LogsConfig {
            channel_capacity: 1,
            drop_when_full: true,
            ..LogsConfig::default()
        };

        let (tx, handle) = start_log_writer(file, path, &cfg);
        // The writer task has not been polled yet on this single-threaded runtime.
        for _ in 0..5 {
            tx.send(b"x\n".to_vec()).await;
        }
        assert!(tx.dropped_count() >= 1);
        drop(tx);
        handle.close(Duration::from_secs(2)).await;
    }
}
