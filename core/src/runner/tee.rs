use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::logs::LogWriterTx;
use crate::util::RingBytes;

/// Copies one child pipe to its raw log, byte for byte, and keeps a tail.
///
/// When `line_tx` is set every line is also forwarded (lossily decoded) to
/// the classifier. Once the receiver is gone forwarding stops, but the pipe
/// keeps being drained so the child never blocks on a full buffer.
pub fn pump<R>(
    src: R,
    ring: RingBytes,
    log: LogWriterTx,
    line_tx: Option<mpsc::UnboundedSender<String>>,
    cancel: CancellationToken,
    stream: &'static str,
) -> JoinHandle<u64>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(src);
        let mut line_tx = line_tx;
        let mut buf: Vec<u8> = Vec::with_capacity(8 * 1024);
        let mut total = 0u64;

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(target: "subagent.runner", stream, "pump cancelled");
                    break;
                }
                r = reader.read_until(b'\n', &mut buf) => r,
            };

            match read {
                Ok(0) => break,
                Ok(n) => {
                    total += n as u64;
                    ring.push(&buf);
                    log.send(buf.clone()).await;

                    if let Some(tx) = &line_tx {
                        let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                        if tx.send(line).is_err() {
                            line_tx = None;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "subagent.runner", stream, error = %e, "pipe read failed");
                    break;
                }
            }
        }

        // Partial line read before a cancellation.
        if !buf.is_empty() {
            ring.push(&buf);
            log.send(std::mem::take(&mut buf)).await;
        }

        tracing::debug!(target: "subagent.runner", stream, bytes = total, "pump finished");
        total
    })
}
