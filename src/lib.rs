//! Drive an interactive program through a pseudo-terminal.
//!
//! [`Process`] spawns a command with its controlling terminal bound to a
//! fresh PTY, relays its output to a caller-supplied sink, and relays
//! injected bytes into its terminal input as if a user typed them. A
//! [`ScriptWriter`] feeds a fixed sequence of lines and then closes the
//! input, and [`Process::wait`] reports the child's exit status.

pub mod error;
pub mod pty;
pub mod script;
pub mod session;
pub mod shutdown;
pub mod transcript;

pub use error::DriverError;
pub use pty::{CommandSpec, ExitStatus, InputWriter, Process, ProcessState};
pub use script::{Script, ScriptWriter};
pub use session::{SessionError, SessionFile};
pub use shutdown::ShutdownHandle;
pub use transcript::Transcript;
