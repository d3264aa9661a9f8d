use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bounded byte buffer keeping the most recent `cap` bytes of a stream.
///
/// Cloning shares the same buffer, so a pump task can push while the
/// runner reads the tail afterwards.
#[derive(Clone, Debug)]
pub struct RingBytes {
    inner: Arc<Mutex<VecDeque<u8>>>,
    cap: usize,
}

impl RingBytes {
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(cap.min(8192)))),
            cap,
        }
    }

    pub fn push(&self, bytes: &[u8]) {
        if self.cap == 0 {
            return;
        }
        let Ok(mut buf) = self.inner.lock() else {
            return;
        };
        let bytes = if bytes.len() > self.cap {
            &bytes[bytes.len() - self.cap..]
        } else {
            bytes
        };
        let overflow = (buf.len() + bytes.len()).saturating_sub(self.cap);
        buf.drain(..overflow);
        buf.extend(bytes);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner
            .lock()
            .map(|b| b.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
