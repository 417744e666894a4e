#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use loo_tui::{CompletionSource, DirEntry, ReadOutcome, Terminal};

/// Terminal that replays scripted input chunks and records every write.
///
/// An empty chunk stands for a pause: the read waits out the requested timeout and reports
/// that nothing arrived.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    inputs: VecDeque<Vec<u8>>,
    pub writes: Vec<String>,
    pub columns: u16,
    pub starts: usize,
    pub stops: usize,
}

impl ScriptedTerminal {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            inputs: chunks.iter().map(|chunk| chunk.to_vec()).collect(),
            writes: Vec::new(),
            columns: 80,
            starts: 0,
            stops: 0,
        }
    }

    pub fn output(&self) -> String {
        self.writes.concat()
    }
}

impl Terminal for ScriptedTerminal {
    fn start(&mut self) -> std::io::Result<()> {
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        self.stops += 1;
        Ok(())
    }

    fn read_input(&mut self, timeout: Option<Duration>) -> std::io::Result<ReadOutcome> {
        match self.inputs.pop_front() {
            None => Ok(ReadOutcome::Closed),
            Some(bytes) if bytes.is_empty() => {
                std::thread::sleep(timeout.unwrap_or_default());
                Ok(ReadOutcome::TimedOut)
            }
            Some(bytes) => Ok(ReadOutcome::Data(bytes)),
        }
    }

    fn write(&mut self, data: &str) -> std::io::Result<()> {
        self.writes.push(data.to_string());
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.columns
    }
}

/// In-memory completion source with two commands and a small tree:
///
/// ```text
/// .env
/// Cargo.toml
/// src/
///   bin/
///   engine.rs
/// ```
pub struct FakeSource {
    commands: Vec<(&'static str, &'static str)>,
    dirs: HashMap<&'static str, Vec<DirEntry>>,
}

impl FakeSource {
    pub fn new() -> Self {
        let mut dirs = HashMap::new();
        dirs.insert(
            ".",
            vec![
                DirEntry::file(".env"),
                DirEntry::file("Cargo.toml"),
                DirEntry::dir("src"),
            ],
        );
        dirs.insert(
            "src/",
            vec![DirEntry::dir("bin"), DirEntry::file("engine.rs")],
        );
        dirs.insert("src/bin/", Vec::new());
        Self {
            commands: vec![
                ("model", "Show or switch the active model"),
                ("list-models", "List available models"),
            ],
            dirs,
        }
    }
}

impl CompletionSource for FakeSource {
    fn command_names(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    fn command_description(&self, name: &str) -> Option<String> {
        self.commands
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, description)| description.to_string())
    }

    fn list_dir(&self, relative_dir: &str) -> Option<Vec<DirEntry>> {
        self.dirs.get(relative_dir).cloned()
    }
}
