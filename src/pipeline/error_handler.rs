//! Typed job failures and the handler they are routed to.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// What can go wrong inside a job. Parse failures never show up here: unparseable values are
/// simply absent from the record.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{name} could not be started: {source}")]
    SpawnFailure {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{name} exited with error code {code}{}", stderr_suffix(.stderr))]
    NonZeroExit {
        name: String,
        code: i32,
        stderr: String,
    },

    #[error("{}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("interrupted by shutdown")]
    Interrupted,
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl JobError {
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// `-1` for a process that never started, the exit code for a failed one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::SpawnFailure { .. } => Some(-1),
            Self::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

/// Receives every error a job could not handle itself. Injected per submission.
pub type ErrorHandler = Arc<dyn Fn(JobError) + Send + Sync>;
