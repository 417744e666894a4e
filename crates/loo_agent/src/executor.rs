//! Shell command execution with captured output, a wall-clock timeout and interrupt support.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::config::{DEFAULT_COMMAND_TIMEOUT_SEC, DEFAULT_MAX_OUTPUT_BYTES};
use crate::error::TaskError;

const POLL_SLICE: Duration = Duration::from_millis(50);
const DRAIN_GRACE: Duration = Duration::from_millis(250);
const TRUNCATED_MARKER: &str = "\n[truncated]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code, or `128 + signal` when the child was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Interrupt state shared with the SIGINT handler.
///
/// While no command runs the flag is idle and SIGINT terminates the process with code 130.
/// While a command runs SIGINT only sets `triggered`, and the executor kills the child.
#[derive(Debug, Clone)]
pub struct InterruptFlag {
    idle: Arc<AtomicBool>,
    triggered: Arc<AtomicBool>,
}

impl Default for InterruptFlag {
    fn default() -> Self {
        Self {
            idle: Arc::new(AtomicBool::new(true)),
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the process SIGINT handlers. Call once from the binary.
    #[cfg(unix)]
    pub fn install_sigint(&self) -> std::io::Result<()> {
        use signal_hook::consts::SIGINT;

        signal_hook::flag::register_conditional_shutdown(SIGINT, 130, Arc::clone(&self.idle))?;
        signal_hook::flag::register(SIGINT, Arc::clone(&self.triggered))?;
        Ok(())
    }

    /// Requests cancellation of the running command.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    fn arm(&self) -> ArmedInterrupt<'_> {
        self.triggered.store(false, Ordering::SeqCst);
        self.idle.store(false, Ordering::SeqCst);
        ArmedInterrupt { flag: self }
    }

    fn take(&self) -> bool {
        self.triggered.swap(false, Ordering::SeqCst)
    }
}

struct ArmedInterrupt<'a> {
    flag: &'a InterruptFlag,
}

impl Drop for ArmedInterrupt<'_> {
    fn drop(&mut self) {
        self.flag.idle.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct CommandExecutor {
    working_dir: PathBuf,
    timeout: Duration,
    max_output_bytes: usize,
    interrupt: InterruptFlag,
}

impl CommandExecutor {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SEC),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            interrupt: InterruptFlag::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Runs `command` in the working directory with the default timeout.
    pub fn run(&self, command: &str) -> Result<CommandOutput, TaskError> {
        self.run_in(command, &self.working_dir, None)
    }

    /// Runs `command` through `sh -c` in `cwd`, blocking until it exits, times out, or is
    /// interrupted.
    pub fn run_in(
        &self,
        command: &str,
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, TaskError> {
        let timeout = timeout.unwrap_or(self.timeout);
        let mut builder = Command::new("sh");
        builder
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            builder.process_group(0);
        }

        let _armed = self.interrupt.arm();
        let mut child = builder.spawn().map_err(|source| TaskError::Spawn {
            command: command.to_string(),
            source,
        })?;
        tracing::debug!(command, pid = child.id(), "spawned command");

        let stdout = StreamCapture::spawn(child.stdout.take(), self.max_output_bytes);
        let stderr = StreamCapture::spawn(child.stderr.take(), self.max_output_bytes);

        let deadline = Instant::now() + timeout;
        let status = loop {
            if self.interrupt.take() {
                tracing::warn!(command, "command interrupted");
                kill_process_group(&mut child);
                return Err(TaskError::Interrupted);
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(command, seconds = timeout.as_secs(), "command timed out");
                kill_process_group(&mut child);
                return Err(TaskError::Timeout {
                    seconds: timeout.as_secs(),
                });
            }

            match child.wait_timeout((deadline - now).min(POLL_SLICE)) {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(source) => {
                    kill_process_group(&mut child);
                    return Err(TaskError::Spawn {
                        command: command.to_string(),
                        source,
                    });
                }
            }
        };

        let output = CommandOutput {
            stdout: stdout.finish(),
            stderr: stderr.finish(),
            exit_code: exit_code(status),
        };
        tracing::debug!(command, exit_code = output.exit_code, "command finished");
        Ok(output)
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Drains one pipe on a reader thread so a chatty child never blocks on a full pipe.
struct StreamCapture {
    captured: Arc<Mutex<Captured>>,
    done: mpsc::Receiver<()>,
}

impl StreamCapture {
    fn spawn(pipe: Option<impl Read + Send + 'static>, cap: usize) -> Self {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let (done_tx, done) = mpsc::channel();

        if let Some(mut pipe) = pipe {
            let sink = Arc::clone(&captured);
            thread::spawn(move || {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(count) => {
                            let mut captured = lock_unpoisoned(&sink);
                            let room = cap.saturating_sub(captured.bytes.len());
                            if count > room {
                                captured.truncated = true;
                            }
                            captured.bytes.extend_from_slice(&chunk[..count.min(room)]);
                        }
                    }
                }
                let _ = done_tx.send(());
            });
        } else {
            let _ = done_tx.send(());
        }

        Self { captured, done }
    }

    /// Waits briefly for the pipe to close; a background grandchild may hold it open forever.
    fn finish(self) -> String {
        let _ = self.done.recv_timeout(DRAIN_GRACE);
        let captured = lock_unpoisoned(&self.captured);
        let mut text = String::from_utf8_lossy(&captured.bytes).into_owned();
        if captured.truncated {
            text.push_str(TRUNCATED_MARKER);
        }
        text
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = libc::pid_t::try_from(child.id()) {
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::{CommandExecutor, InterruptFlag};
    use std::time::Duration;

    #[test]
    fn output_is_capped_with_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let executor = CommandExecutor::new(dir.path()).with_max_output_bytes(4);
        let output = executor.run("printf abcdefgh").expect("run");
        assert_eq!(output.stdout, "abcd\n[truncated]");
    }

    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let executor = CommandExecutor::new(dir.path());
        let output = executor.run("kill -9 $$").expect("run");
        assert_eq!(output.exit_code, 137);
        assert!(!output.success());
    }

    #[test]
    fn stale_trigger_is_cleared_when_a_command_starts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let flag = InterruptFlag::new();
        flag.trigger();
        let executor = CommandExecutor::new(dir.path())
            .with_interrupt(flag)
            .with_timeout(Duration::from_secs(5));
        let output = executor.run("true").expect("run");
        assert!(output.success());
    }
}
