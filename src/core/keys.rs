//! Raw terminal bytes to key events.
//!
//! Only the legacy (non-kitty) encodings are understood: CSI and SS3 cursor keys, C0 control
//! bytes, UTF-8 text, and bracketed paste. Incomplete escape tails stay pending until either
//! the next read completes them or the escape timeout passes.

use std::time::{Duration, Instant};

pub const DEFAULT_ESCAPE_TIMEOUT: Duration = Duration::from_millis(50);

const ESC: char = '\x1b';
const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    CtrlLeft,
    CtrlRight,
    /// Ctrl plus a lowercase ASCII letter.
    Ctrl(char),
    /// Alt (ESC prefix) plus a lowercase ASCII letter.
    Alt(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(Key),
    Text(String),
    Paste(String),
    /// A sequence we do not act on.
    Unknown(String),
}

#[derive(Debug)]
enum SequenceStatus {
    Complete,
    Incomplete,
}

/// Splits byte chunks into events, carrying incomplete escape sequences between chunks.
#[derive(Debug)]
pub struct KeyDecoder {
    pending: String,
    paste: Option<String>,
    escape_timeout: Duration,
    flush_deadline: Option<Instant>,
}

impl Default for KeyDecoder {
    fn default() -> Self {
        Self::with_escape_timeout(DEFAULT_ESCAPE_TIMEOUT)
    }
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_escape_timeout(escape_timeout: Duration) -> Self {
        Self {
            pending: String::new(),
            paste: None,
            escape_timeout,
            flush_deadline: None,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<InputEvent> {
        self.flush_deadline = None;
        let events = self.decode(bytes);
        if !self.pending.is_empty() {
            self.flush_deadline = Some(Instant::now() + self.escape_timeout);
        }
        events
    }

    /// Emits the pending tail once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<InputEvent> {
        if self.pending.is_empty() {
            self.flush_deadline = None;
            return Vec::new();
        }
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// How long a read may block before the pending tail must be flushed.
    pub fn next_timeout(&self, now: Instant) -> Option<Duration> {
        self.flush_deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Emits the pending tail verbatim. A lone ESC becomes the Escape key.
    pub fn flush(&mut self) -> Vec<InputEvent> {
        self.flush_deadline = None;
        let pending = std::mem::take(&mut self.pending);
        match pending.as_str() {
            "" => Vec::new(),
            "\x1b" => vec![InputEvent::Key(Key::Escape)],
            _ => vec![InputEvent::Unknown(pending)],
        }
    }

    fn decode(&mut self, bytes: &[u8]) -> Vec<InputEvent> {
        let mut data = std::mem::take(&mut self.pending);
        data.push_str(&String::from_utf8_lossy(bytes));

        let mut events = Vec::new();
        let mut rest = data.as_str();

        loop {
            if let Some(paste) = self.paste.as_mut() {
                match rest.find(PASTE_END) {
                    Some(end) => {
                        paste.push_str(&rest[..end]);
                        let text = self.paste.take().unwrap_or_default();
                        events.push(InputEvent::Paste(text));
                        rest = &rest[end + PASTE_END.len()..];
                        continue;
                    }
                    None => {
                        paste.push_str(rest);
                        return events;
                    }
                }
            }

            match rest.find(PASTE_START) {
                Some(start) => {
                    self.decode_plain(&rest[..start], &mut events);
                    self.paste = Some(String::new());
                    rest = &rest[start + PASTE_START.len()..];
                }
                None => {
                    self.decode_plain(rest, &mut events);
                    return events;
                }
            }
        }
    }

    fn decode_plain(&mut self, data: &str, events: &mut Vec<InputEvent>) {
        let mut pos = 0;
        while pos < data.len() {
            let tail = &data[pos..];
            if tail.starts_with(ESC) {
                match escape_sequence_len(tail) {
                    (SequenceStatus::Complete, len) => {
                        events.push(decode_escape(&tail[..len]));
                        pos += len;
                    }
                    (SequenceStatus::Incomplete, _) => {
                        self.pending = tail.to_string();
                        return;
                    }
                }
                continue;
            }

            let Some(ch) = tail.chars().next() else {
                break;
            };
            pos += ch.len_utf8();
            match decode_control(ch) {
                Some(event) => events.push(event),
                None => push_text(events, ch),
            }
        }
    }
}

fn push_text(events: &mut Vec<InputEvent>, ch: char) {
    if let Some(InputEvent::Text(text)) = events.last_mut() {
        text.push(ch);
        return;
    }
    events.push(InputEvent::Text(ch.to_string()));
}

fn decode_control(ch: char) -> Option<InputEvent> {
    let key = match ch {
        '\r' | '\n' => Key::Enter,
        '\t' => Key::Tab,
        '\x7f' | '\x08' => Key::Backspace,
        '\x01'..='\x1a' => Key::Ctrl((b'a' + (ch as u8 - 1)) as char),
        c if c.is_control() => return Some(InputEvent::Unknown(c.to_string())),
        _ => return None,
    };
    Some(InputEvent::Key(key))
}

fn escape_sequence_len(data: &str) -> (SequenceStatus, usize) {
    let bytes = data.as_bytes();
    match bytes.get(1) {
        None => (SequenceStatus::Incomplete, 1),
        Some(b'[') => {
            for (idx, byte) in bytes.iter().enumerate().skip(2) {
                if (0x40..=0x7e).contains(byte) {
                    return (SequenceStatus::Complete, idx + 1);
                }
            }
            (SequenceStatus::Incomplete, bytes.len())
        }
        Some(b'O') => {
            if bytes.len() >= 3 {
                (SequenceStatus::Complete, 3)
            } else {
                (SequenceStatus::Incomplete, bytes.len())
            }
        }
        Some(_) => {
            let next = data[1..].chars().next().map(char::len_utf8).unwrap_or(1);
            (SequenceStatus::Complete, 1 + next)
        }
    }
}

fn decode_escape(sequence: &str) -> InputEvent {
    let key = match sequence {
        "\x1b[A" | "\x1bOA" => Key::Up,
        "\x1b[B" | "\x1bOB" => Key::Down,
        "\x1b[C" | "\x1bOC" => Key::Right,
        "\x1b[D" | "\x1bOD" => Key::Left,
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => Key::Home,
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => Key::End,
        "\x1b[3~" => Key::Delete,
        "\x1b[1;5D" | "\x1b[5D" => Key::CtrlLeft,
        "\x1b[1;5C" | "\x1b[5C" => Key::CtrlRight,
        "\x1b\x1b" => Key::Escape,
        _ => return decode_alt(sequence),
    };
    InputEvent::Key(key)
}

fn decode_alt(sequence: &str) -> InputEvent {
    let mut chars = sequence.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(ESC), Some(ch), None) if ch.is_ascii_lowercase() => InputEvent::Key(Key::Alt(ch)),
        _ => InputEvent::Unknown(sequence.to_string()),
    }
}
