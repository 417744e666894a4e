//! Interactive chat loop: the terminal input engine wired to the slash-command registry.

use std::io;

use loo_tui::{CompletionSource, DirEntry, InputEngine, Submission, Terminal};

use crate::catalog::ModelCatalog;
use crate::commands::{InteractiveSession, SlashOutput, SlashRegistry};
use crate::dispatcher::Dispatcher;
use crate::sandbox::Sandbox;

/// Completion candidates from the registry and the sandboxed working directory.
pub struct SlashCompletionSource<'a> {
    registry: &'a SlashRegistry,
    sandbox: &'a Sandbox,
}

impl<'a> SlashCompletionSource<'a> {
    pub fn new(registry: &'a SlashRegistry, sandbox: &'a Sandbox) -> Self {
        Self { registry, sandbox }
    }
}

impl CompletionSource for SlashCompletionSource<'_> {
    fn command_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn command_description(&self, name: &str) -> Option<String> {
        self.registry.description(name).map(str::to_string)
    }

    fn list_dir(&self, relative_dir: &str) -> Option<Vec<DirEntry>> {
        self.sandbox.completion_listing(relative_dir)
    }
}

/// Everything the chat loop borrows for its lifetime.
pub struct Chat<'a> {
    pub dispatcher: &'a mut Dispatcher,
    pub registry: &'a SlashRegistry,
    pub catalog: &'a dyn ModelCatalog,
    pub session: &'a mut InteractiveSession,
}

impl Chat<'_> {
    /// Reads lines until `/quit`, Ctrl+C or Ctrl+D on an empty prompt, or closed input.
    pub fn run<T: Terminal>(&mut self, engine: &mut InputEngine<T>) -> io::Result<()> {
        tracing::info!(
            root = %self.dispatcher.sandbox().root().display(),
            "chat session started"
        );
        loop {
            let submission = {
                let source =
                    SlashCompletionSource::new(self.registry, self.dispatcher.sandbox());
                engine.read_submission(&source)?
            };
            let line = match submission {
                Submission::Line(line) => line,
                Submission::Exit => break,
            };

            match self.handle_line(&line) {
                Some(text) => write_block(engine.terminal_mut(), &text)?,
                None => break,
            }
        }
        tracing::info!(prompts = self.session.transcript.len(), "chat session ended");
        Ok(())
    }

    /// Routes one submitted line. `None` means the session should end.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        match self
            .registry
            .execute(line, self.dispatcher, self.catalog, self.session)
        {
            Some(SlashOutput::Quit) => None,
            Some(SlashOutput::Text(text)) => Some(text),
            None => {
                self.session.transcript.push(line.to_string());
                let model = self
                    .session
                    .active_model
                    .as_deref()
                    .unwrap_or("no model selected");
                Some(format!(
                    "Prompt recorded ({model}, {} in transcript)",
                    self.session.transcript.len()
                ))
            }
        }
    }
}

fn write_block(terminal: &mut impl Terminal, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    terminal.write(&format!("{text}\n"))
}
