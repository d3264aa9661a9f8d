use std::io::Write;

use indicatif::ProgressDrawTarget;
use subagent_core::api::{BackendStrategy, ProgressSink};

use crate::backend::ClaudeBackendStrategy;
use crate::progress::{BatchProgress, InteractiveProgress};

pub fn build_backend() -> Box<dyn BackendStrategy> {
    Box::new(ClaudeBackendStrategy)
}

/// Spinner when stdout is a terminal, plain lines otherwise. Decided once.
pub fn build_progress_sink() -> Box<dyn ProgressSink> {
    let interactive = atty::is(atty::Stream::Stdout);
    tracing::debug!(interactive, "progress sink selected");
    if interactive {
        Box::new(InteractiveProgress::stdout())
    } else {
        build_progress_sink_for(false, std::io::stdout())
    }
}

/// Sink writing its lines to `out`. The interactive spinner itself is
/// only drawn when `out` is stdout; here it gets a hidden target.
pub fn build_progress_sink_for<W>(interactive: bool, out: W) -> Box<dyn ProgressSink>
where
    W: Write + Send + 'static,
{
    if interactive {
        Box::new(InteractiveProgress::new(out, ProgressDrawTarget::hidden))
    } else {
        Box::new(BatchProgress::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use subagent_core::api::{Run, SubagentResult};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn drive(sink: &mut dyn ProgressSink) {
        let run = Run::new("list files", "/work", Duration::from_secs(5));
        let id = run.run_id.clone();
        sink.run_started(&run);
        std::thread::sleep(Duration::from_millis(450));
        sink.tool_used(&id, "Bash");
        sink.agent_completed(&id);
        sink.run_finished(&id, &SubagentResult::success("done"), None);
    }

    #[test]
    fn non_interactive_sink_writes_plain_lines() {
        let buf = SharedBuf::default();
        let mut sink = build_progress_sink_for(false, buf.clone());
        drive(sink.as_mut());

        let text = buf.text();
        assert!(!text.contains('\r'));
        assert!(!text.contains('\u{1b}'));
        // the spinner prefix only ever appears in a drawn frame
        assert!(!text.contains(" running"), "spinner output in {text:?}");
        let got: Vec<&str> = text.lines().collect();
        assert_eq!(got.len(), 6);
        assert!(got.iter().all(|l| l.starts_with("[subagent] ")));
    }

    #[test]
    fn interactive_sink_keeps_the_spinner_off_the_text_stream() {
        let buf = SharedBuf::default();
        let mut sink = build_progress_sink_for(true, buf.clone());
        drive(sink.as_mut());

        let text = buf.text();
        assert!(!text.contains('\r'));
        assert_eq!(text.lines().count(), 6);
        assert!(text.ends_with("[subagent] result: done\n"));
    }
}
