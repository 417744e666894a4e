//! The stdio request/response loop.
//!
//! One line in, one line out. The next instruction is not read until the Feedback for the
//! current one has been written and flushed, so working-directory mutations are serialized.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::dispatcher::{Dispatcher, DispatcherState};
use crate::protocol::{Feedback, InitialQuery, Instruction, TaskOutput, UNKNOWN_TASK_ID};

pub const INPUT_CLOSED_MESSAGE: &str = "input closed unexpectedly";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub project_description: String,
    pub working_directory: PathBuf,
    pub instruction_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A `complete` instruction was processed.
    Completed,
    /// The input channel closed first.
    InputClosed,
}

impl SessionOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::InputClosed => 1,
        }
    }
}

pub struct ProtocolEngine<R, W> {
    input: R,
    output: W,
    dispatcher: Dispatcher,
    context: SessionContext,
}

impl<R: BufRead, W: Write> ProtocolEngine<R, W> {
    pub fn new(
        project_description: impl Into<String>,
        dispatcher: Dispatcher,
        input: R,
        output: W,
    ) -> Self {
        let context = SessionContext {
            project_description: project_description.into(),
            working_directory: dispatcher.sandbox().root().to_path_buf(),
            instruction_count: 0,
        };
        Self {
            input,
            output,
            dispatcher,
            context,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Writes the initial query, then serves instructions until `complete` or end of input.
    ///
    /// Only I/O failures on the protocol channel itself are returned as errors.
    pub fn run(&mut self) -> io::Result<SessionOutcome> {
        let initial = InitialQuery {
            project_description: self.context.project_description.clone(),
            working_directory: self.context.working_directory.display().to_string(),
        };
        self.write_line(&initial)?;
        tracing::info!(
            working_directory = %initial.working_directory,
            "protocol session started"
        );

        let mut line = Vec::new();
        loop {
            line.clear();
            if self.input.read_until(b'\n', &mut line)? == 0 {
                tracing::warn!(
                    instructions = self.context.instruction_count,
                    "input closed before complete"
                );
                let feedback = Feedback::warning(
                    UNKNOWN_TASK_ID,
                    TaskOutput::empty(),
                    vec![INPUT_CLOSED_MESSAGE.to_string()],
                );
                self.write_line(&feedback)?;
                return Ok(SessionOutcome::InputClosed);
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let feedback = match serde_json::from_slice::<Instruction>(&line) {
                Ok(instruction) => {
                    let feedback = self.dispatcher.dispatch(&instruction);
                    self.context.instruction_count += 1;
                    feedback
                }
                Err(err) => {
                    tracing::debug!(error = %err, "unparsable instruction line");
                    Feedback::error(UNKNOWN_TASK_ID, format!("invalid instruction: {err}"))
                }
            };
            self.write_line(&feedback)?;

            if self.dispatcher.state() == DispatcherState::Completed {
                tracing::info!(
                    instructions = self.context.instruction_count,
                    "protocol session completed"
                );
                return Ok(SessionOutcome::Completed);
            }
        }
    }

    fn write_line(&mut self, value: &impl Serialize) -> io::Result<()> {
        serde_json::to_writer(&mut self.output, value).map_err(io::Error::from)?;
        self.output.write_all(b"\n")?;
        self.output.flush()
    }
}
