use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::ProgressSink;

/// Notices raised while the agent is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressNotice {
    ToolUsed { run_id: String, tool: String },
    AgentCompleted { run_id: String },
}

/// Sending half of a progress sink that runs on its own blocking thread.
///
/// `send` never waits, so a sink stuck on a slow terminal or a full pipe
/// cannot hold up stream classification, log writes or the deadline.
#[derive(Clone)]
pub struct ProgressTx {
    tx: mpsc::UnboundedSender<ProgressNotice>,
}

impl ProgressTx {
    pub fn send(&self, notice: ProgressNotice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!(target: "subagent.engine", "progress forwarder gone, notice dropped");
        }
    }
}

/// Owns the sink while the run is in flight.
pub struct ProgressForwarder {
    tx: ProgressTx,
    task: JoinHandle<Box<dyn ProgressSink>>,
}

impl ProgressForwarder {
    pub fn start(sink: Box<dyn ProgressSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressNotice>();
        let task = tokio::task::spawn_blocking(move || {
            let mut sink = sink;
            while let Some(notice) = rx.blocking_recv() {
                match notice {
                    ProgressNotice::ToolUsed { run_id, tool } => sink.tool_used(&run_id, &tool),
                    ProgressNotice::AgentCompleted { run_id } => sink.agent_completed(&run_id),
                }
            }
            sink
        });
        Self {
            tx: ProgressTx { tx },
            task,
        }
    }

    pub fn tx(&self) -> &ProgressTx {
        &self.tx
    }

    /// Closes the channel and takes the sink back once it has drained.
    ///
    /// Returns `None` if the sink is still busy after `wait`; it is then
    /// left to finish on its own thread.
    pub async fn finish(self, wait: Duration) -> Option<Box<dyn ProgressSink>> {
        let Self { tx, task } = self;
        drop(tx);
        match tokio::time::timeout(wait, task).await {
            Ok(Ok(sink)) => Some(sink),
            Ok(Err(e)) => {
                tracing::warn!(target: "subagent.engine", error = %e, "progress sink panicked");
                None
            }
            Err(_) => {
                tracing::warn!(
                    target: "subagent.engine",
                    wait_ms = wait.as_millis() as u64,
                    "progress sink still busy, final summary skipped"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Run;
    use crate::logs::LogPaths;
    use crate::result::SubagentResult;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
        delay: Duration,
    }

    impl ProgressSink for Recorder {
        fn run_started(&mut self, _run: &Run) {}

        fn tool_used(&mut self, _run_id: &str, tool: &str) {
            std::thread::sleep(self.delay);
            self.seen.lock().unwrap().push(format!("tool:{tool}"));
        }

        fn agent_completed(&mut self, run_id: &str) {
            self.seen.lock().unwrap().push(format!("done:{run_id}"));
        }

        fn run_finished(&mut self, _run_id: &str, _result: &SubagentResult, _logs: Option<&LogPaths>) {}
    }

    #[tokio::test]
    async fn notices_reach_the_sink_in_order() {
        let rec = Recorder::default();
        let fwd = ProgressForwarder::start(Box::new(rec.clone()));
        fwd.tx().send(ProgressNotice::ToolUsed {
            run_id: "r1".into(),
            tool: "Read".into(),
        });
        fwd.tx().send(ProgressNotice::AgentCompleted { run_id: "r1".into() });

        assert!(fwd.finish(Duration::from_secs(2)).await.is_some());
        assert_eq!(*rec.seen.lock().unwrap(), vec!["tool:Read", "done:r1"]);
    }

    #[tokio::test]
    async fn blocking_sink_never_blocks_the_sender() {
        let rec = Recorder {
            delay: Duration::from_secs(1),
            ..Recorder::default()
        };
        let fwd = ProgressForwarder::start(Box::new(rec));

        let started = Instant::now();
        for i in 0..3 {
            fwd.tx().send(ProgressNotice::ToolUsed {
                run_id: "r1".into(),
                tool: format!("t{i}"),
            });
        }
        assert!(started.elapsed() < Duration::from_millis(500));

        assert!(fwd.finish(Duration::from_millis(100)).await.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
