use tokio::sync::mpsc;

/// Write end of the input channel feeding the child's terminal.
///
/// Bytes queued here are forwarded verbatim into the PTY by the input
/// relay loop, so the child sees them exactly as keystrokes. Dropping the
/// writer closes the channel; the relay loop then terminates cleanly and
/// releases its side of the PTY.
pub struct InputWriter {
    tx: mpsc::Sender<Vec<u8>>,
}

impl InputWriter {
    pub(crate) fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Queue raw bytes for the child's terminal input.
    ///
    /// Fire-and-forget: if the channel is already closed (the process was
    /// never started, or its input loop is gone) the bytes are dropped
    /// and the loss is logged, never escalated.
    pub async fn send(&self, bytes: impl Into<Vec<u8>>) {
        if self.tx.send(bytes.into()).await.is_err() {
            tracing::debug!("input channel closed, dropping injected bytes");
        }
    }

    /// Queue one line, newline-terminated, as if typed and entered.
    pub async fn send_line(&self, line: &str) {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        self.send(bytes).await;
    }
}
