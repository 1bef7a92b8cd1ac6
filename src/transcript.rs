use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{sleep, Instant};

/// Shared capture buffer for child output.
///
/// The output relay loop writes into it from a background task; tests
/// and the CLI read cumulative snapshots from the original handle.
/// Terminal drivers interleave echoed input with program output and chunk
/// arbitrarily, so readers should assert substring containment on the
/// snapshot, never exact framing.
#[derive(Clone, Default)]
pub struct Transcript {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink handle suitable for [`Process::start`](crate::pty::Process::start).
    pub fn writer(&self) -> Box<dyn Write + Send> {
        Box::new(TranscriptWriter {
            buffer: Arc::clone(&self.buffer),
        })
    }

    /// Everything captured so far, lossily decoded.
    pub fn snapshot(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.snapshot().contains(needle)
    }

    /// Poll until `needle` appears in the captured output or the timeout
    /// passes. Returns whether it was seen.
    pub async fn wait_for(&self, needle: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.contains(needle) {
                return true;
            }
            sleep(Duration::from_millis(20)).await;
        }
        self.contains(needle)
    }
}

struct TranscriptWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for TranscriptWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
