#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use loo_agent::config::AgentConfig;
use loo_agent::{Dispatcher, Feedback, InterruptFlag};
use loo_tui::{ReadOutcome, Terminal};
use serde_json::Value;

pub fn dispatcher_at(root: &Path) -> Dispatcher {
    Dispatcher::from_config(root, &AgentConfig::default(), InterruptFlag::new())
        .expect("workspace root should be valid")
}

pub fn instruction_line(task_id: &str, task_type: &str, params: Value) -> String {
    serde_json::json!({
        "task_id": task_id,
        "task_type": task_type,
        "params": params,
    })
    .to_string()
}

pub fn parse_feedback(line: &str) -> Feedback {
    serde_json::from_str(line).unwrap_or_else(|err| panic!("bad feedback line {line:?}: {err}"))
}

#[derive(Default)]
pub struct TerminalTrace {
    pub inputs: VecDeque<Vec<u8>>,
    pub writes: Vec<String>,
    pub start_calls: usize,
    pub stop_calls: usize,
}

impl TerminalTrace {
    pub fn output(&self) -> String {
        self.writes.concat()
    }
}

/// Scripted terminal whose trace stays inspectable after the engine takes ownership.
pub struct SharedTerminal {
    state: Arc<Mutex<TerminalTrace>>,
    columns: u16,
}

impl SharedTerminal {
    pub fn new(chunks: &[&[u8]]) -> (Self, Arc<Mutex<TerminalTrace>>) {
        let state = Arc::new(Mutex::new(TerminalTrace {
            inputs: chunks.iter().map(|chunk| chunk.to_vec()).collect(),
            ..TerminalTrace::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
                columns: 80,
            },
            state,
        )
    }
}

impl Terminal for SharedTerminal {
    fn start(&mut self) -> std::io::Result<()> {
        lock_unpoisoned(&self.state).start_calls += 1;
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        lock_unpoisoned(&self.state).stop_calls += 1;
        Ok(())
    }

    fn read_input(&mut self, _timeout: Option<Duration>) -> std::io::Result<ReadOutcome> {
        Ok(match lock_unpoisoned(&self.state).inputs.pop_front() {
            Some(bytes) => ReadOutcome::Data(bytes),
            None => ReadOutcome::Closed,
        })
    }

    fn write(&mut self, data: &str) -> std::io::Result<()> {
        lock_unpoisoned(&self.state).writes.push(data.to_string());
        Ok(())
    }

    fn columns(&self) -> u16 {
        self.columns
    }
}

/// Log sink for a scoped `tracing` subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Subscriber at `warn` that writes into this sink, like the binary's default filter.
    pub fn warn_subscriber(&self) -> tracing::Dispatch {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::Dispatch::new(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&lock_unpoisoned(&self.0))
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        lock_unpoisoned(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
