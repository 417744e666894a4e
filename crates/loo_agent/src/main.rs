use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use loo_agent::catalog::StaticModelCatalog;
use loo_agent::commands::{InteractiveSession, SlashRegistry};
use loo_agent::interactive::Chat;
use loo_agent::{logging, AgentConfig, Dispatcher, InterruptFlag, ProtocolEngine};
use loo_tui::{InputEngine, ProcessTerminal};

#[derive(Parser)]
#[command(name = "loo", version, about = "Sandboxed execution core for an LLM coding agent")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve line-delimited JSON instructions on stdin/stdout
    Serve {
        /// Project description sent in the initial query
        project_description: String,
        /// Working directory (defaults to the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Override the run_command timeout in seconds
        #[arg(long = "timeout-sec")]
        timeout_sec: Option<u64>,
    },
    /// Interactive prompt with slash commands and @path completion
    Chat {
        /// Working directory (defaults to the current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!(error = %err, "loo failed");
            eprintln!("loo: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> io::Result<u8> {
    let mut config = AgentConfig::from_env().map_err(io::Error::other)?;
    let interrupt = InterruptFlag::new();
    #[cfg(unix)]
    interrupt.install_sigint()?;

    match cli.command {
        CliCommand::Serve {
            project_description,
            dir,
            timeout_sec,
        } => {
            if let Some(timeout_sec) = timeout_sec.filter(|seconds| *seconds > 0) {
                config.command_timeout_sec = timeout_sec;
            }
            let root = working_directory(dir)?;
            let dispatcher =
                Dispatcher::from_config(&root, &config, interrupt).map_err(io::Error::other)?;
            let stdin = io::stdin().lock();
            let stdout = io::stdout().lock();
            let mut engine = ProtocolEngine::new(project_description, dispatcher, stdin, stdout);
            let outcome = engine.run()?;
            Ok(outcome.exit_code())
        }
        CliCommand::Chat { dir } => {
            let root = working_directory(dir)?;
            let mut dispatcher =
                Dispatcher::from_config(&root, &config, interrupt).map_err(io::Error::other)?;
            let catalog = match &config.models_path {
                Some(path) => StaticModelCatalog::from_path(path).map_err(io::Error::other)?,
                None => StaticModelCatalog::default(),
            };
            let registry = SlashRegistry::with_builtins();
            let mut session = InteractiveSession::new();
            let mut engine = InputEngine::new(ProcessTerminal::new(), "> ");

            Chat {
                dispatcher: &mut dispatcher,
                registry: &registry,
                catalog: &catalog,
                session: &mut session,
            }
            .run(&mut engine)?;
            Ok(0)
        }
    }
}

fn working_directory(dir: Option<PathBuf>) -> io::Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir(),
    }
}
