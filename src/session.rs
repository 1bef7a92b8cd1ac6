use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::pty::CommandSpec;

/// Errors that can occur when loading a session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse session file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("session validation failed: {message}")]
    Validation { message: String },
}

/// A TOML description of one scripted run.
///
/// ```toml
/// command = "sh"
/// args = ["-i"]
/// lines = ["echo hello", "exit"]
///
/// [env]
/// PS1 = ""
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Lines typed into the child, in order, each newline-terminated.
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl SessionFile {
    /// Read and validate a session file.
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let session: SessionFile =
            toml::from_str(&content).map_err(|source| SessionError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        session.validate()?;
        Ok(session)
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.command.is_empty() {
            return Err(SessionError::Validation {
                message: "'command' must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Build the command specification this session describes.
    pub fn to_spec(&self) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.command).args(self.args.clone());
        for (key, value) in &self.env {
            spec = spec.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            spec = spec.cwd(dir);
        }
        spec
    }
}
