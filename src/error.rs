use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while installing redirections. Streams are untouched when one is returned.
#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("{}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("syntax error near unexpected token `newline'")]
    MissingTarget { operator: &'static str },
}

/// Failures of an external command, already in the shape shown to the user.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Error: {0}")]
    Spawn(#[source] io::Error),
    #[error("Error: exit status {0}")]
    Exited(i32),
    #[error("Error: signal {0}")]
    Signaled(i32),
    #[error("Error: {0}")]
    Io(#[from] io::Error),
}
