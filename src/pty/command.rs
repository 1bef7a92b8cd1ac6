use std::path::PathBuf;

use portable_pty::CommandBuilder;

/// Specification of the command to supervise: program path plus argument
/// list, with optional environment additions and working directory.
///
/// No shell interpretation happens here. A caller that wants shell
/// semantics spawns a shell as the program, the same way it would with a
/// plain process-spawn call.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args_list(&self) -> &[String] {
        &self.args
    }

    /// Build the spawnable command. `TERM` defaults to `xterm-256color`;
    /// an explicit `env("TERM", ..)` on the spec wins because it is
    /// applied afterwards.
    pub(crate) fn to_builder(&self) -> CommandBuilder {
        let mut cmd = CommandBuilder::new(&self.program);
        cmd.args(&self.args);
        cmd.env("TERM", "xterm-256color");
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            cmd.cwd(dir);
        }
        cmd
    }
}
