//! Error types for the process supervisor.
//!
//! Only lifecycle failures reach the caller. I/O errors inside the relay
//! loops are logged by the loop that hit them and terminate that loop
//! alone; the exit status stays observable either way.

use thiserror::Error;

/// Errors surfaced by [`Process`](crate::pty::Process).
#[derive(Debug, Error)]
pub enum DriverError {
    /// The pseudo-terminal could not be allocated.
    #[error("failed to allocate pseudo-terminal: {0}")]
    OpenPty(anyhow::Error),

    /// The command could not be spawned (missing executable, permission
    /// denied). Any already-allocated PTY has been released.
    #[error("failed to spawn '{command}': {reason}")]
    Spawn {
        command: String,
        reason: anyhow::Error,
    },

    /// `start` was called on a process that is already running or has
    /// already exited.
    #[error("process already started")]
    AlreadyStarted,

    /// `wait` was called before a successful `start`.
    #[error("process has not been started")]
    NotStarted,

    /// Waiting on the child itself failed.
    #[error("failed waiting for child")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    /// The background task waiting on the child was cancelled or panicked.
    #[error("exit waiter task failed: {0}")]
    WaitTask(#[from] tokio::task::JoinError),
}
