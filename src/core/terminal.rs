//! Terminal trait and lifecycle helpers.

use std::time::Duration;

/// Result of one bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Data(Vec<u8>),
    /// Nothing arrived within the requested timeout.
    TimedOut,
    /// The input stream is closed.
    Closed,
}

/// Minimal blocking terminal interface for the input engine.
pub trait Terminal {
    /// Enter raw mode and enable bracketed paste.
    fn start(&mut self) -> std::io::Result<()>;

    /// Restore the terminal to the state it had before `start`.
    fn stop(&mut self) -> std::io::Result<()>;

    /// Block until input arrives, or until `timeout` passes when one is given.
    fn read_input(&mut self, timeout: Option<Duration>) -> std::io::Result<ReadOutcome>;

    /// Write output to the terminal and flush it.
    fn write(&mut self, data: &str) -> std::io::Result<()>;

    /// Terminal width in cells.
    fn columns(&self) -> u16;
}

/// RAII guard that stops the terminal on drop, even when the keystroke loop bails early.
pub struct TerminalGuard<'a, T: Terminal> {
    terminal: &'a mut T,
    stopped: bool,
}

impl<'a, T: Terminal> TerminalGuard<'a, T> {
    pub fn start(terminal: &'a mut T) -> std::io::Result<Self> {
        terminal.start()?;
        Ok(Self {
            terminal,
            stopped: false,
        })
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        self.terminal
    }

    /// Stop explicitly so the error is observable.
    pub fn stop(mut self) -> std::io::Result<()> {
        self.stopped = true;
        self.terminal.stop()
    }
}

impl<T: Terminal> Drop for TerminalGuard<'_, T> {
    fn drop(&mut self) {
        if !self.stopped {
            let _ = self.terminal.stop();
        }
    }
}
