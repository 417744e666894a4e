use std::path::PathBuf;

use thiserror::Error;

/// Everything that can keep a task from producing a successful result.
///
/// Each variant is reported through Feedback; none of them ends the session.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{reason}")]
    Validation { field: &'static str, reason: String },

    #[error("path escapes the working directory: {path}")]
    SandboxViolation { path: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("command interrupted")]
    Interrupted,

    #[error("unknown task_type")]
    UnknownTaskType,

    #[error("session already completed")]
    SessionCompleted,
}

impl TaskError {
    pub fn missing(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: format!("missing required field `{field}`"),
        }
    }

    pub fn wrong_kind(field: &'static str, expected: &str) -> Self {
        Self::Validation {
            field,
            reason: format!("field `{field}` must be {expected}"),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
