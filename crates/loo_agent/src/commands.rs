//! Slash commands typed directly at the interactive prompt.
//!
//! A line whose first word is `/<name>` for a registered name is handled here and never
//! forwarded. Task-type commands build an [`Instruction`] and go through the same
//! [`Dispatcher`] the protocol engine uses.

use serde_json::{Map, Value};

use crate::catalog::{filter_models, ModelCatalog};
use crate::dispatcher::Dispatcher;
use crate::protocol::{Feedback, Instruction, Status, TaskOutput, TaskType};

const LIST_MODELS_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashOutput {
    Text(String),
    Quit,
}

pub type SlashHandler = fn(&mut SlashContext<'_>, &str) -> SlashOutput;

#[derive(Clone, Copy)]
pub struct SlashCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: SlashHandler,
}

impl std::fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlashCommand")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// In-memory state of one interactive session. Nothing here outlives the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractiveSession {
    pub active_model: Option<String>,
    /// Free-form prompts handed to the model client, oldest first.
    pub transcript: Vec<String>,
    slash_tasks: u64,
}

impl InteractiveSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_task_id(&mut self) -> String {
        self.slash_tasks += 1;
        format!("slash-{}", self.slash_tasks)
    }
}

pub struct SlashContext<'a> {
    pub dispatcher: &'a mut Dispatcher,
    pub catalog: &'a dyn ModelCatalog,
    pub session: &'a mut InteractiveSession,
    pub registry: &'a SlashRegistry,
}

/// How a raw input line is routed.
#[derive(Debug, Clone, Copy)]
pub enum Interception<'a> {
    Command {
        command: SlashCommand,
        args: &'a str,
    },
    Forward,
}

/// Ordered command registry. Registration order is suggestion order.
#[derive(Debug, Clone, Default)]
pub struct SlashRegistry {
    commands: Vec<SlashCommand>,
}

impl SlashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for command in builtin_commands() {
            registry.register(command);
        }
        registry
    }

    /// Adds `command`, replacing any earlier command with the same name in place.
    pub fn register(&mut self, command: SlashCommand) {
        match self
            .commands
            .iter_mut()
            .find(|existing| existing.name == command.name)
        {
            Some(existing) => *existing = command,
            None => self.commands.push(command),
        }
    }

    pub fn commands(&self) -> &[SlashCommand] {
        &self.commands
    }

    pub fn names(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|command| command.name.to_string())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&SlashCommand> {
        self.commands.iter().find(|command| command.name == name)
    }

    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.get(name).map(|command| command.description)
    }

    pub fn intercept<'l>(&self, line: &'l str) -> Interception<'l> {
        let Some(rest) = line.strip_prefix('/') else {
            return Interception::Forward;
        };
        let (name, args) = split_first_word(rest);
        match self.get(name) {
            Some(command) => Interception::Command {
                command: *command,
                args,
            },
            None => Interception::Forward,
        }
    }

    /// Runs `line` if it names a registered command. `None` means the line should be forwarded.
    pub fn execute(
        &self,
        line: &str,
        dispatcher: &mut Dispatcher,
        catalog: &dyn ModelCatalog,
        session: &mut InteractiveSession,
    ) -> Option<SlashOutput> {
        let Interception::Command { command, args } = self.intercept(line) else {
            return None;
        };
        tracing::debug!(command = command.name, args, "slash command");
        let mut context = SlashContext {
            dispatcher,
            catalog,
            session,
            registry: self,
        };
        Some((command.handler)(&mut context, args))
    }
}

fn split_first_word(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim()),
        None => (text, ""),
    }
}

fn builtin_commands() -> Vec<SlashCommand> {
    vec![
        SlashCommand {
            name: "help",
            description: "Show available commands",
            handler: help_command,
        },
        SlashCommand {
            name: "clear",
            description: "Clear the conversation transcript",
            handler: clear_command,
        },
        SlashCommand {
            name: "model",
            description: "Show or change the active model",
            handler: model_command,
        },
        SlashCommand {
            name: "list-models",
            description: "List available models [search]",
            handler: list_models_command,
        },
        SlashCommand {
            name: "create_file",
            description: "Create a file <path> [content]",
            handler: create_file_command,
        },
        SlashCommand {
            name: "create_directory",
            description: "Create a directory <path>",
            handler: create_directory_command,
        },
        SlashCommand {
            name: "read_file",
            description: "Print a file <path>",
            handler: read_file_command,
        },
        SlashCommand {
            name: "list_directory",
            description: "List a directory [path]",
            handler: list_directory_command,
        },
        SlashCommand {
            name: "run_command",
            description: "Run a shell command <command>",
            handler: run_command_command,
        },
        SlashCommand {
            name: "query_context",
            description: "Summarize the project [full|directory] [path]",
            handler: query_context_command,
        },
        SlashCommand {
            name: "quit",
            description: "Exit the session",
            handler: quit_command,
        },
    ]
}

fn help_command(context: &mut SlashContext<'_>, _args: &str) -> SlashOutput {
    let lines: Vec<String> = context
        .registry
        .commands()
        .iter()
        .map(|command| format!("  /{:<18}{}", command.name, command.description))
        .collect();
    SlashOutput::Text(format!("Commands:\n{}", lines.join("\n")))
}

fn clear_command(context: &mut SlashContext<'_>, _args: &str) -> SlashOutput {
    let removed = context.session.transcript.len();
    context.session.transcript.clear();
    SlashOutput::Text(format!("Conversation cleared ({removed} prompts removed)"))
}

fn model_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let requested = args.trim();
    if requested.is_empty() {
        let text = match &context.session.active_model {
            Some(model) => format!("Active model: {model}"),
            None => "No model selected. Usage: /model <model_id>".to_string(),
        };
        return SlashOutput::Text(text);
    }

    let models = match context.catalog.list_models() {
        Ok(models) => models,
        Err(err) => return SlashOutput::Text(format!("Failed to fetch models: {err}")),
    };
    if !models.contains_key(requested) {
        return SlashOutput::Text(format!(
            "Unknown model '{requested}'. Use /list-models to see available models"
        ));
    }

    let previous = context.session.active_model.replace(requested.to_string());
    tracing::info!(model = requested, "active model changed");
    SlashOutput::Text(match previous {
        Some(previous) => format!("Model changed from '{previous}' to '{requested}'"),
        None => format!("Model set to '{requested}'"),
    })
}

fn list_models_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let search = args.trim();
    let models = match context.catalog.list_models() {
        Ok(models) => models,
        Err(err) => return SlashOutput::Text(format!("Failed to fetch models: {err}")),
    };
    let matches = filter_models(&models, search);

    if matches.is_empty() {
        return SlashOutput::Text(if search.is_empty() {
            "No models available".to_string()
        } else {
            format!("No models found matching '{search}'")
        });
    }

    let mut text = if search.is_empty() {
        format!("Available models ({}):", matches.len())
    } else {
        format!("Models matching '{search}' ({}):", matches.len())
    };
    for (id, info) in matches.iter().take(LIST_MODELS_LIMIT) {
        text.push_str(&format!("\n  {id}  {}", info.name));
    }
    if matches.len() > LIST_MODELS_LIMIT {
        text.push_str(&format!(
            "\n  ... and {} more",
            matches.len() - LIST_MODELS_LIMIT
        ));
    }
    SlashOutput::Text(text)
}

fn quit_command(_context: &mut SlashContext<'_>, _args: &str) -> SlashOutput {
    SlashOutput::Quit
}

fn create_file_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let (path, content) = split_first_word(args);
    let mut params = Map::new();
    insert_non_empty(&mut params, "path", path);
    params.insert("content".to_string(), Value::String(content.to_string()));
    run_task(context, TaskType::CreateFile, params)
}

fn create_directory_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let mut params = Map::new();
    insert_non_empty(&mut params, "path", args.trim());
    run_task(context, TaskType::CreateDirectory, params)
}

fn read_file_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let mut params = Map::new();
    insert_non_empty(&mut params, "path", args.trim());
    run_task(context, TaskType::ReadFile, params)
}

fn list_directory_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let mut params = Map::new();
    insert_non_empty(&mut params, "path", args.trim());
    run_task(context, TaskType::ListDirectory, params)
}

fn run_command_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let mut params = Map::new();
    insert_non_empty(&mut params, "command", args.trim());
    run_task(context, TaskType::RunCommand, params)
}

fn query_context_command(context: &mut SlashContext<'_>, args: &str) -> SlashOutput {
    let (kind, path) = split_first_word(args);
    let mut params = Map::new();
    insert_non_empty(&mut params, "kind", kind);
    insert_non_empty(&mut params, "path", path);
    run_task(context, TaskType::QueryContext, params)
}

fn insert_non_empty(params: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        params.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn run_task(
    context: &mut SlashContext<'_>,
    task_type: TaskType,
    params: Map<String, Value>,
) -> SlashOutput {
    let instruction = Instruction {
        task_id: context.session.next_task_id(),
        task_type,
        params,
        follow_up_query: None,
    };
    let feedback = context.dispatcher.dispatch(&instruction);
    SlashOutput::Text(render_feedback(&feedback))
}

/// Human-readable rendering of a Feedback for the terminal.
pub fn render_feedback(feedback: &Feedback) -> String {
    let mut lines = Vec::new();
    match &feedback.output {
        TaskOutput::ReadFile { content, .. } => lines.push(content.trim_end().to_string()),
        TaskOutput::ListDirectory { entries } => {
            lines.extend(entries.iter().map(|entry| {
                if entry.is_dir {
                    format!("{}/", entry.name)
                } else {
                    entry.name.clone()
                }
            }));
        }
        TaskOutput::RunCommand {
            stdout,
            stderr,
            exit_code,
            ..
        } => {
            if !stdout.is_empty() {
                lines.push(stdout.trim_end().to_string());
            }
            if !stderr.is_empty() {
                lines.push(stderr.trim_end().to_string());
            }
            lines.push(format!("[exit code {exit_code}]"));
        }
        TaskOutput::QueryContext {
            directory_listing,
            truncated,
        } => {
            lines.extend(directory_listing.iter().cloned());
            if *truncated {
                lines.push("... (truncated)".to_string());
            }
        }
        TaskOutput::Empty {} => {
            if feedback.status == Status::Success {
                lines.push("ok".to_string());
            }
        }
    }

    let label = match feedback.status {
        Status::Success => None,
        Status::Warning => Some("warning"),
        Status::Error => Some("error"),
    };
    if let Some(label) = label {
        lines.extend(feedback.errors.iter().map(|error| format!("{label}: {error}")));
    }
    lines.join("\n")
}
