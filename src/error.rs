//! Errors raised while a command runs.
//!
//! Stage failures of the build pipeline are not errors; they are reported and
//! returned as `false`. What ends up here is either bad user input or an I/O
//! problem with no defined recovery, and the dispatcher prints both as
//! `Error: <message>` before moving on to the next command.

use crate::catalog::ResolutionError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A collaborator whose failure has no boolean contract exited non-zero.
    #[error("'{program}' failed ({status})")]
    Status { program: String, status: ExitStatus },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CommandError {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn spawn(program: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
