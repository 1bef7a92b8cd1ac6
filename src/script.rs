use tokio::task::JoinHandle;

use crate::pty::InputWriter;

/// An ordered sequence of lines to type into the child's terminal.
///
/// Lines are forwarded verbatim, each with a trailing newline appended;
/// no parsing or validation happens on the way through.
#[derive(Debug, Clone, Default)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Feeds a [`Script`] into a process, line by line, then closes the input.
pub struct ScriptWriter;

impl ScriptWriter {
    /// Spawn the feeding task.
    ///
    /// Lines are fire-and-forget: no acknowledgment is awaited between
    /// them. After the last line the input writer is dropped, which
    /// closes the channel exactly once and ends the input relay loop the
    /// way a user closing the session would. Runs independently of
    /// process startup; if the process never starts, the sends are
    /// dropped quietly.
    pub fn spawn(input: InputWriter, script: Script) -> JoinHandle<()> {
        tokio::spawn(async move {
            for line in script.lines() {
                input.send_line(line).await;
            }
            tracing::debug!(lines = script.lines().len(), "script finished, closing input");
        })
    }
}
