use std::io::Write;
use std::time::Duration;

use portable_pty::{native_pty_system, ChildKiller, ExitStatus, MasterPty, PtySize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::DriverError;
use crate::pty::command::CommandSpec;
use crate::pty::input::InputWriter;
use crate::pty::relay;
use crate::shutdown::ShutdownHandle;

const PTY_ROWS: u16 = 24;
const PTY_COLS: u16 = 80;

/// Injected input chunks buffered before the script writer suspends,
/// the in-process analogue of a pipe's buffer.
const INPUT_CHANNEL_CAPACITY: usize = 64;

/// How long `wait` gives the relay loops to observe end-of-stream after
/// the child has exited before it stops waiting on them.
const RELAY_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Lifecycle state of a [`Process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Command bound, no OS resources taken yet.
    Created,
    /// PTY allocated, child spawned, relay loops running.
    Running,
    /// The child has exited and its status is cached.
    Exited,
}

/// Supervisor for one child process bound to a pseudo-terminal.
///
/// ```no_run
/// use ptydrive::{CommandSpec, Process, Transcript};
///
/// # async fn demo() -> Result<(), ptydrive::DriverError> {
/// let mut process = Process::new(CommandSpec::new("sh"));
/// let input = process.take_input().expect("first take");
/// let transcript = Transcript::new();
/// process.start(transcript.writer())?;
///
/// input.send_line("echo hello").await;
/// input.send_line("exit").await;
/// drop(input);
///
/// let status = process.wait().await?;
/// assert!(status.success());
/// # Ok(())
/// # }
/// ```
pub struct Process {
    spec: CommandSpec,
    state: ProcessState,
    input_tx: Option<mpsc::Sender<Vec<u8>>>,
    input_rx: Option<mpsc::Receiver<Vec<u8>>>,
    master: Option<Box<dyn MasterPty + Send>>,
    killer: Option<Box<dyn ChildKiller + Send + Sync>>,
    waiter: Option<JoinHandle<std::io::Result<ExitStatus>>>,
    output_loop: Option<JoinHandle<u64>>,
    input_loop: Option<JoinHandle<u64>>,
    shutdown: ShutdownHandle,
    status: Option<ExitStatus>,
}

impl Process {
    /// Bind a command. Takes no OS resources until [`start`](Self::start).
    pub fn new(spec: CommandSpec) -> Self {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        Self {
            spec,
            state: ProcessState::Created,
            input_tx: Some(input_tx),
            input_rx: Some(input_rx),
            master: None,
            killer: None,
            waiter: None,
            output_loop: None,
            input_loop: None,
            shutdown: ShutdownHandle::new(),
            status: None,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Take the write end of the input channel.
    ///
    /// Returns `None` on every call after the first, and after `start` if
    /// the end was never taken: `start` drops an unclaimed write end so
    /// the input relay loop sees a closed channel instead of waiting for
    /// input that can never arrive.
    pub fn take_input(&mut self) -> Option<InputWriter> {
        self.input_tx.take().map(InputWriter::new)
    }

    /// Cancellation token for this process. Signalling it makes a
    /// concurrent or later [`wait`](Self::wait) kill the child.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Allocate a PTY, spawn the command on it, and launch the relay
    /// loops and the exit waiter.
    ///
    /// On failure nothing keeps running: no loops were started and the
    /// PTY pair, if it was allocated, is released on the way out. Calling
    /// `start` a second time is a usage error.
    pub fn start(&mut self, sink: Box<dyn Write + Send>) -> Result<(), DriverError> {
        if self.state != ProcessState::Created {
            return Err(DriverError::AlreadyStarted);
        }

        let pty = native_pty_system();
        let pair = pty
            .openpty(PtySize {
                rows: PTY_ROWS,
                cols: PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(DriverError::OpenPty)?;

        let mut child = pair
            .slave
            .spawn_command(self.spec.to_builder())
            .map_err(|err| DriverError::Spawn {
                command: self.spec.program().to_string(),
                reason: err,
            })?;
        // The slave side lives on in the child; holding it open here
        // would keep the terminal open past the child's exit.
        drop(pair.slave);

        let reader = match pair.master.try_clone_reader() {
            Ok(reader) => reader,
            Err(err) => {
                let _ = child.kill();
                return Err(DriverError::OpenPty(err));
            }
        };
        let writer = match pair.master.take_writer() {
            Ok(writer) => writer,
            Err(err) => {
                let _ = child.kill();
                return Err(DriverError::OpenPty(err));
            }
        };

        let input_rx = self.input_rx.take().ok_or(DriverError::AlreadyStarted)?;
        // An unclaimed write end would keep the input loop alive forever.
        drop(self.input_tx.take());

        self.killer = Some(child.clone_killer());
        self.output_loop = Some(tokio::task::spawn_blocking(move || {
            relay::pump_output(reader, sink)
        }));
        self.input_loop = Some(tokio::task::spawn_blocking(move || {
            relay::pump_input(input_rx, writer)
        }));
        self.waiter = Some(tokio::task::spawn_blocking(move || child.wait()));
        self.master = Some(pair.master);
        self.state = ProcessState::Running;

        tracing::debug!(program = self.spec.program(), "child spawned under pty");
        Ok(())
    }

    /// Suspend until the child exits and return its exit status.
    ///
    /// Idempotent: the first result is cached and later calls return it
    /// without blocking. If the [`ShutdownHandle`] is signalled while
    /// waiting, the child is killed and the resulting status (non-success)
    /// is returned. Before returning, both relay loops are given a
    /// bounded grace period to observe end-of-stream, so no copy task
    /// outlives `wait` silently.
    pub async fn wait(&mut self) -> Result<ExitStatus, DriverError> {
        if let Some(status) = &self.status {
            return Ok(status.clone());
        }

        let mut waiter = self.waiter.take().ok_or(DriverError::NotStarted)?;

        let shutdown = self.shutdown.clone();
        let raced = tokio::select! {
            result = &mut waiter => Some(result),
            _ = shutdown.wait() => None,
        };
        let result = match raced {
            Some(result) => result,
            None => {
                tracing::debug!("cancellation signalled, killing child");
                self.kill();
                waiter.await
            }
        };

        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => return Err(DriverError::Wait { source }),
            Err(join_err) => return Err(DriverError::WaitTask(join_err)),
        };

        self.state = ProcessState::Exited;
        self.status = Some(status.clone());
        tracing::debug!(code = status.exit_code(), "child exited");

        // Release the parent's PTY handle exactly once, then let the
        // loops drain. The output loop ends on end-of-stream from the
        // child's exit; the input loop ends when the script writer closes
        // the channel, which may lag behind the child.
        drop(self.master.take());
        self.drain_relays().await;

        Ok(status)
    }

    /// Force-terminate the child. Harmless if it already exited.
    pub fn kill(&mut self) {
        if let Some(killer) = &mut self.killer {
            if let Err(err) = killer.kill() {
                tracing::warn!("failed to kill child: {err}");
            }
        }
    }

    async fn drain_relays(&mut self) {
        if let Some(handle) = self.output_loop.take() {
            match tokio::time::timeout(RELAY_DRAIN_GRACE, handle).await {
                Ok(Ok(bytes)) => tracing::debug!(bytes, "output relay finished"),
                Ok(Err(err)) => tracing::warn!("output relay task failed: {err}"),
                Err(_) => tracing::warn!("output relay did not drain within grace period"),
            }
        }
        if let Some(handle) = self.input_loop.take() {
            match tokio::time::timeout(RELAY_DRAIN_GRACE, handle).await {
                Ok(Ok(bytes)) => tracing::debug!(bytes, "input relay finished"),
                Ok(Err(err)) => tracing::warn!("input relay task failed: {err}"),
                Err(_) => tracing::warn!("input relay did not drain within grace period"),
            }
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        // A supervisor dropped mid-run must not leave the child attached
        // to a terminal nobody reads from.
        if self.state == ProcessState::Running {
            self.kill();
        }
    }
}
