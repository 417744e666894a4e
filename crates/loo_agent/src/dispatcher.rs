//! Routes instructions to the sandbox, the executor and the snapshot builder.

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::config::AgentConfig;
use crate::error::TaskError;
use crate::executor::{CommandExecutor, InterruptFlag};
use crate::protocol::{Feedback, Instruction, TaskOutput, TaskType};
use crate::sandbox::Sandbox;
use crate::snapshot::{SnapshotBuilder, SnapshotKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Executing,
    Completed,
}

/// Typed access to instruction params with field-specific errors.
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Params<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn required_str(&self, field: &'static str) -> Result<&'a str, TaskError> {
        self.optional_str(field)?.ok_or_else(|| TaskError::missing(field))
    }

    pub fn optional_str(&self, field: &'static str) -> Result<Option<&'a str>, TaskError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(TaskError::wrong_kind(field, "a string")),
        }
    }

    pub fn optional_positive(&self, field: &'static str) -> Result<Option<u64>, TaskError> {
        match self.map.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match value.as_u64() {
                Some(number) if number > 0 => Ok(Some(number)),
                _ => Err(TaskError::wrong_kind(field, "a positive integer")),
            },
        }
    }
}

struct Outcome {
    output: TaskOutput,
    warnings: Vec<String>,
}

impl Outcome {
    fn ok(output: TaskOutput) -> Self {
        Self {
            output,
            warnings: Vec::new(),
        }
    }
}

pub struct Dispatcher {
    sandbox: Sandbox,
    executor: CommandExecutor,
    snapshot_cap: usize,
    state: DispatcherState,
}

impl Dispatcher {
    pub fn new(sandbox: Sandbox, executor: CommandExecutor, snapshot_cap: usize) -> Self {
        Self {
            sandbox,
            executor,
            snapshot_cap,
            state: DispatcherState::Idle,
        }
    }

    /// Builds a dispatcher rooted at `root` with limits taken from `config`.
    pub fn from_config(
        root: impl AsRef<Path>,
        config: &AgentConfig,
        interrupt: InterruptFlag,
    ) -> Result<Self, TaskError> {
        let sandbox = Sandbox::new(root)?.with_read_max_bytes(config.read_max_bytes);
        let executor = CommandExecutor::new(sandbox.root())
            .with_timeout(Duration::from_secs(config.command_timeout_sec))
            .with_max_output_bytes(config.max_output_bytes)
            .with_interrupt(interrupt);
        Ok(Self::new(sandbox, executor, config.snapshot_cap))
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Produces exactly one Feedback for `instruction`. Never panics on bad input.
    pub fn dispatch(&mut self, instruction: &Instruction) -> Feedback {
        let task_id = instruction.task_id.as_str();
        if self.state == DispatcherState::Completed {
            return Feedback::error(task_id, TaskError::SessionCompleted.to_string());
        }
        if instruction.task_type == TaskType::Unknown {
            tracing::debug!(task_id, "rejecting unknown task type");
            return Feedback::error(task_id, TaskError::UnknownTaskType.to_string());
        }

        tracing::debug!(
            task_id,
            task_type = instruction.task_type.as_str(),
            follow_up_query = instruction.follow_up_query.as_deref(),
            "dispatching instruction"
        );

        self.state = DispatcherState::Executing;
        let result = self.execute(instruction.task_type, Params::new(&instruction.params));
        self.state = match (&result, instruction.task_type) {
            (Ok(_), TaskType::Complete) => DispatcherState::Completed,
            _ => DispatcherState::Idle,
        };

        match result {
            Ok(outcome) if outcome.warnings.is_empty() => {
                Feedback::success(task_id, outcome.output)
            }
            Ok(outcome) => Feedback::warning(task_id, outcome.output, outcome.warnings),
            Err(err) => {
                tracing::debug!(task_id, error = %err, "task failed");
                Feedback::error(task_id, err.to_string())
            }
        }
    }

    fn execute(&self, task_type: TaskType, params: Params<'_>) -> Result<Outcome, TaskError> {
        match task_type {
            TaskType::CreateFile => {
                let path = params.required_str("path")?;
                let content = params.optional_str("content")?.unwrap_or_default();
                self.sandbox.create_file(path, content)?;
                Ok(Outcome::ok(TaskOutput::empty()))
            }
            TaskType::CreateDirectory => {
                self.sandbox.create_directory(params.required_str("path")?)?;
                Ok(Outcome::ok(TaskOutput::empty()))
            }
            TaskType::ReadFile => {
                let content = self.sandbox.read_file(params.required_str("path")?)?;
                Ok(Outcome::ok(TaskOutput::ReadFile {
                    content_length: content.len(),
                    content,
                }))
            }
            TaskType::ListDirectory => {
                let path = params.optional_str("path")?.unwrap_or(".");
                let entries = self.sandbox.list_directory(path)?;
                Ok(Outcome::ok(TaskOutput::ListDirectory { entries }))
            }
            TaskType::RunCommand => self.run_command(params),
            TaskType::QueryContext => {
                let kind = match params.optional_str("kind")? {
                    Some(kind) => kind,
                    None => params.optional_str("type")?.unwrap_or("full"),
                };
                let kind = SnapshotKind::parse(kind)?;
                let path = params.optional_str("path")?.unwrap_or(".");
                let snapshot =
                    SnapshotBuilder::new(&self.sandbox, self.snapshot_cap).build(kind, path)?;
                Ok(Outcome::ok(TaskOutput::QueryContext {
                    directory_listing: snapshot.directory_listing,
                    truncated: snapshot.truncated,
                }))
            }
            TaskType::Complete => {
                let summary = params.optional_str("summary")?;
                tracing::info!(summary, "session completed");
                Ok(Outcome::ok(TaskOutput::empty()))
            }
            TaskType::Unknown => Err(TaskError::UnknownTaskType),
        }
    }

    fn run_command(&self, params: Params<'_>) -> Result<Outcome, TaskError> {
        let command = params.required_str("command")?;
        if command.trim().is_empty() {
            return Err(TaskError::invalid("command", "field `command` must not be empty"));
        }
        let timeout = params.optional_positive("timeout_sec")?.map(Duration::from_secs);
        let cwd = match params.optional_str("cwd")? {
            Some(cwd) => {
                let resolved = self.sandbox.resolve(cwd)?;
                if !resolved.is_dir() {
                    return Err(TaskError::invalid(
                        "cwd",
                        "field `cwd` must name an existing directory",
                    ));
                }
                resolved
            }
            None => self.sandbox.root().to_path_buf(),
        };

        let output = self.executor.run_in(command, &cwd, timeout)?;
        let warnings = if output.success() {
            Vec::new()
        } else {
            vec![format!("command exited with code {}", output.exit_code)]
        };
        Ok(Outcome {
            output: TaskOutput::RunCommand {
                success: output.success(),
                stdout: output.stdout,
                stderr: output.stderr,
                exit_code: output.exit_code,
            },
            warnings,
        })
    }
}
