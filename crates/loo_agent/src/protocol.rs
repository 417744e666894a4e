//! Wire types for the line-delimited JSON protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use loo_tui::DirEntry;

/// `task_id` used when a line cannot be trusted to carry one.
pub const UNKNOWN_TASK_ID: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    CreateFile,
    CreateDirectory,
    ReadFile,
    ListDirectory,
    RunCommand,
    QueryContext,
    Complete,
    /// Any task type this engine does not know.
    #[serde(other)]
    Unknown,
}

impl TaskType {
    pub const ALL: [TaskType; 7] = [
        TaskType::CreateFile,
        TaskType::CreateDirectory,
        TaskType::ReadFile,
        TaskType::ListDirectory,
        TaskType::RunCommand,
        TaskType::QueryContext,
        TaskType::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateFile => "create_file",
            Self::CreateDirectory => "create_directory",
            Self::ReadFile => "read_file",
            Self::ListDirectory => "list_directory",
            Self::RunCommand => "run_command",
            Self::QueryContext => "query_context",
            Self::Complete => "complete",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub task_id: String,
    pub task_type: TaskType,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
    Error,
}

/// Per-task output payload.
///
/// Untagged variants are tried in declaration order, so `Empty` stays last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    ReadFile {
        content: String,
        content_length: usize,
    },
    ListDirectory {
        entries: Vec<DirEntry>,
    },
    RunCommand {
        success: bool,
        stdout: String,
        stderr: String,
        exit_code: i32,
    },
    QueryContext {
        directory_listing: Vec<String>,
        truncated: bool,
    },
    Empty {},
}

impl TaskOutput {
    pub fn empty() -> Self {
        Self::Empty {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub task_id: String,
    pub status: Status,
    pub output: TaskOutput,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Feedback {
    pub fn success(task_id: impl Into<String>, output: TaskOutput) -> Self {
        Self {
            task_id: task_id.into(),
            status: Status::Success,
            output,
            errors: Vec::new(),
        }
    }

    pub fn warning(task_id: impl Into<String>, output: TaskOutput, errors: Vec<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: Status::Warning,
            output,
            errors,
        }
    }

    pub fn error(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: Status::Error,
            output: TaskOutput::empty(),
            errors: vec![message.into()],
        }
    }
}

/// First line written by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialQuery {
    pub project_description: String,
    pub working_directory: String,
}
