mod command;
mod input;
mod process;
mod relay;

pub use command::CommandSpec;
pub use input::InputWriter;
pub use process::{Process, ProcessState};

pub use portable_pty::ExitStatus;
