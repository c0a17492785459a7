use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Git command failed with exit code {code:?}")]
    CommandFailed {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Git command timed out after {timeout:?}")]
    Timeout {
        timeout: Duration,
        stdout: String,
        stderr: String,
    },

    #[error("Output listener failed during dispatch")]
    Listener(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// Stdout collected before the command failed, if any was captured.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { stdout, .. } | GitError::Timeout { stdout, .. } => {
                Some(stdout)
            }
            _ => None,
        }
    }

    /// Stderr collected before the command failed, if any was captured.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { stderr, .. } | GitError::Timeout { stderr, .. } => {
                Some(stderr)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitError>;
