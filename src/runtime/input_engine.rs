//! Keystroke loop for the interactive prompt.
//!
//! One keystroke is decoded, applied to the [`InputBuffer`], the autocomplete state is
//! recomputed from the new text, and the frame is redrawn before the next read. There is no
//! background work and no debouncing. Reads are bounded only while the decoder holds an
//! incomplete escape tail.

use std::time::Instant;

use crate::core::autocomplete::CompletionSource;
use crate::core::input_buffer::InputBuffer;
use crate::core::keys::{InputEvent, Key, KeyDecoder};
use crate::core::terminal::{ReadOutcome, Terminal, TerminalGuard};
use crate::render::frame::{render_frame, Frame};

/// What the prompt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Line(String),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Submit,
    Exit,
}

/// Line editor state that outlives a single submission.
#[derive(Debug, Default)]
struct Editor {
    decoder: KeyDecoder,
    /// Last non-empty cut, inserted again by Ctrl+Y.
    kill_ring: String,
}

pub struct InputEngine<T: Terminal> {
    terminal: T,
    prompt: String,
    editor: Editor,
}

impl<T: Terminal> InputEngine<T> {
    pub fn new(terminal: T, prompt: impl Into<String>) -> Self {
        Self {
            terminal,
            prompt: prompt.into(),
            editor: Editor::default(),
        }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Runs the keystroke loop until Enter submits a non-empty line or the user exits.
    ///
    /// The terminal is in raw mode only for the duration of this call.
    pub fn read_submission(
        &mut self,
        source: &impl CompletionSource,
    ) -> std::io::Result<Submission> {
        let mut guard = TerminalGuard::start(&mut self.terminal)?;
        let submission = keystroke_loop(
            guard.terminal_mut(),
            &mut self.editor,
            &self.prompt,
            source,
        )?;
        guard.stop()?;
        Ok(submission)
    }
}

fn keystroke_loop<T: Terminal>(
    terminal: &mut T,
    editor: &mut Editor,
    prompt: &str,
    source: &impl CompletionSource,
) -> std::io::Result<Submission> {
    let mut buffer = InputBuffer::new();
    redraw(terminal, &mut buffer, prompt, source)?;

    loop {
        let timeout = editor.decoder.next_timeout(Instant::now());
        let events = match terminal.read_input(timeout)? {
            ReadOutcome::Data(bytes) => editor.decoder.feed(&bytes),
            ReadOutcome::TimedOut => editor.decoder.flush_due(Instant::now()),
            ReadOutcome::Closed => {
                finish_line(terminal, &mut buffer, prompt, source)?;
                return Ok(Submission::Exit);
            }
        };

        for event in events {
            match apply_event(&mut buffer, &mut editor.kill_ring, event) {
                Step::Continue => {
                    buffer.refresh(source);
                    redraw(terminal, &mut buffer, prompt, source)?;
                }
                Step::Submit => {
                    let line = buffer.text().trim().to_string();
                    if line.is_empty() {
                        buffer.clear();
                        buffer.refresh(source);
                        redraw(terminal, &mut buffer, prompt, source)?;
                        continue;
                    }
                    finish_line(terminal, &mut buffer, prompt, source)?;
                    return Ok(Submission::Line(line));
                }
                Step::Exit => {
                    finish_line(terminal, &mut buffer, prompt, source)?;
                    return Ok(Submission::Exit);
                }
            }
        }
    }
}

fn apply_event(buffer: &mut InputBuffer, kill_ring: &mut String, event: InputEvent) -> Step {
    match event {
        InputEvent::Text(text) => buffer.insert_str(&text),
        InputEvent::Paste(text) => {
            let flattened: String = text
                .chars()
                .map(|ch| if ch == '\r' || ch == '\n' { ' ' } else { ch })
                .collect();
            buffer.insert_str(&flattened);
        }
        InputEvent::Key(key) => return apply_key(buffer, kill_ring, key),
        InputEvent::Unknown(raw) => {
            tracing::trace!(?raw, "ignoring unrecognized input sequence");
        }
    }
    Step::Continue
}

fn apply_key(buffer: &mut InputBuffer, kill_ring: &mut String, key: Key) -> Step {
    match key {
        Key::Enter => return Step::Submit,
        Key::Tab => {
            buffer.accept_selection();
        }
        Key::Backspace => {
            buffer.backspace();
        }
        Key::Delete => {
            buffer.delete();
        }
        Key::Left | Key::Ctrl('b') => buffer.move_left(),
        Key::Right | Key::Ctrl('f') => buffer.move_right(),
        Key::Home | Key::Ctrl('a') => buffer.move_home(),
        Key::End | Key::Ctrl('e') => buffer.move_end(),
        Key::Up | Key::Ctrl('p') => buffer.select_previous(),
        Key::Down | Key::Ctrl('n') => buffer.select_next(),
        Key::CtrlLeft | Key::Alt('b') => buffer.move_word_left(),
        Key::CtrlRight | Key::Alt('f') => buffer.move_word_right(),
        Key::Alt('d') => buffer.delete_word_after(),
        Key::Ctrl('u') => remember_cut(kill_ring, buffer.cut_to_start()),
        Key::Ctrl('k') => remember_cut(kill_ring, buffer.cut_to_end()),
        Key::Ctrl('w') => remember_cut(kill_ring, buffer.cut_word_before()),
        Key::Ctrl('y') => buffer.insert_str(kill_ring),
        Key::Escape => buffer.clear(),
        Key::Ctrl('c') => {
            if buffer.is_empty() {
                return Step::Exit;
            }
            buffer.clear();
        }
        Key::Ctrl('d') => {
            if buffer.is_empty() {
                return Step::Exit;
            }
            buffer.delete();
        }
        Key::Ctrl(_) | Key::Alt(_) => {}
    }
    Step::Continue
}

fn remember_cut(kill_ring: &mut String, cut: String) {
    if !cut.is_empty() {
        *kill_ring = cut;
    }
}

fn redraw<T: Terminal>(
    terminal: &mut T,
    buffer: &mut InputBuffer,
    prompt: &str,
    source: &impl CompletionSource,
) -> std::io::Result<Frame> {
    let describe = |name: &str| source.command_description(name);
    let frame = render_frame(buffer, prompt, terminal.columns(), &describe);
    terminal.write(&frame.output)?;
    Ok(frame)
}

/// Erases the suggestion rows and leaves the cursor on a fresh line below the input.
fn finish_line<T: Terminal>(
    terminal: &mut T,
    buffer: &mut InputBuffer,
    prompt: &str,
    source: &impl CompletionSource,
) -> std::io::Result<()> {
    buffer.dismiss_suggestions();
    buffer.move_end();
    redraw(terminal, buffer, prompt, source)?;
    terminal.write("\r\n")
}
