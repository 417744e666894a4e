//! Execution core of the loo coding agent.
//!
//! An external model (or a human at the prompt) drives filesystem and command operations
//! against a sandboxed working directory. Machine-authored instructions arrive through
//! [`engine::ProtocolEngine`]; human-authored slash commands go through
//! [`commands::SlashRegistry`]. Both end up in the same [`dispatcher::Dispatcher`].

pub mod catalog;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod executor;
pub mod interactive;
pub mod logging;
pub mod protocol;
pub mod sandbox;
pub mod snapshot;

pub use catalog::{ModelCatalog, ModelInfo, StaticModelCatalog};
pub use commands::{InteractiveSession, SlashCommand, SlashOutput, SlashRegistry};
pub use config::AgentConfig;
pub use dispatcher::{Dispatcher, DispatcherState};
pub use engine::{ProtocolEngine, SessionContext, SessionOutcome};
pub use error::TaskError;
pub use executor::{CommandExecutor, CommandOutput, InterruptFlag};
pub use protocol::{Feedback, InitialQuery, Instruction, Status, TaskOutput, TaskType};
pub use sandbox::Sandbox;
