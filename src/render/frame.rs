//! Frame composition for the prompt line and the suggestion rows beneath it.
//!
//! Between frames the cursor is parked on the input line. Suggestion rows live directly below
//! it. Each frame first erases the rows the previous frame actually drew, then draws its own
//! rows and moves back up by exactly the number it drew. The two counts are independent, so a
//! transition from N rows to zero still erases N rows and returns to the same line.

use unicode_width::UnicodeWidthChar;

use crate::core::autocomplete::AutocompleteState;
use crate::core::input_buffer::InputBuffer;

const CLEAR_LINE: &str = "\x1b[2K";
const SELECTED_MARKER: &str = "> ";
const UNSELECTED_MARKER: &str = "  ";
const DESCRIPTION_COLUMN: usize = 20;

/// Escape output for one redraw plus the row bookkeeping that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub output: String,
    /// Rows cleared below the input line (the previous frame's drawn count).
    pub erased_lines: usize,
    /// Rows drawn below the input line by this frame.
    pub drawn_lines: usize,
    /// Cursor column on the input line after the frame.
    pub cursor_column: usize,
}

/// Supplies command descriptions while rendering suggestion rows.
pub trait DescribeCommand {
    fn describe(&self, name: &str) -> Option<String>;
}

impl<F> DescribeCommand for F
where
    F: Fn(&str) -> Option<String>,
{
    fn describe(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Builds the next frame and records its drawn row count on the buffer.
pub fn render_frame(
    buffer: &mut InputBuffer,
    prompt: &str,
    columns: u16,
    describe: &impl DescribeCommand,
) -> Frame {
    let columns = usize::from(columns.max(1));
    let erase = buffer.lines_rendered_prev_frame;
    let rows = suggestion_rows(buffer, columns, describe);
    let drawn = rows.len();

    let mut output = String::new();
    for _ in 0..erase {
        output.push_str("\x1b[1B\r");
        output.push_str(CLEAR_LINE);
    }
    if erase > 0 {
        output.push_str(&format!("\x1b[{erase}A"));
    }

    let (visible, cursor_column) = input_window(buffer, prompt, columns);
    output.push('\r');
    output.push_str(CLEAR_LINE);
    output.push_str(prompt);
    output.push_str(&visible);

    for row in &rows {
        output.push_str("\r\n");
        output.push_str(CLEAR_LINE);
        output.push_str(row);
    }
    if drawn > 0 {
        output.push_str(&format!("\x1b[{drawn}A"));
    }

    output.push('\r');
    if cursor_column > 0 {
        output.push_str(&format!("\x1b[{cursor_column}C"));
    }

    buffer.lines_rendered_prev_frame = drawn;
    tracing::trace!(erase, drawn, cursor_column, "input frame");

    Frame {
        output,
        erased_lines: erase,
        drawn_lines: drawn,
        cursor_column,
    }
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

fn str_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = char_width(ch);
        if width + ch_width > max_width {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    out
}

/// Picks the slice of input that fits on one line with the cursor visible.
fn input_window(buffer: &InputBuffer, prompt: &str, columns: usize) -> (String, usize) {
    let prompt_width = str_width(prompt);
    // Keep the last column free so the cursor never wraps.
    let available = columns.saturating_sub(prompt_width + 1).max(1);
    let chars = buffer.chars();
    let cursor = buffer.cursor_index();

    let mut start = 0;
    while chars[start..cursor].iter().copied().map(char_width).sum::<usize>() > available {
        start += 1;
    }

    let mut width = 0;
    let mut end = start;
    while end < chars.len() {
        let ch_width = char_width(chars[end]);
        if width + ch_width > available {
            break;
        }
        width += ch_width;
        end += 1;
    }

    let visible: String = chars[start..end].iter().collect();
    let cursor_width: usize = chars[start..cursor].iter().copied().map(char_width).sum();
    (visible, prompt_width + cursor_width)
}

fn suggestion_rows(
    buffer: &InputBuffer,
    columns: usize,
    describe: &impl DescribeCommand,
) -> Vec<String> {
    let state = buffer.autocomplete_state();
    let visible = state.suggestion_lines();
    if visible == 0 {
        return Vec::new();
    }

    // Scroll the window so the selection stays on screen.
    let selected = buffer.selected();
    let first = selected.saturating_sub(visible - 1);
    let max_width = columns.saturating_sub(1);

    let labels: Vec<String> = match state {
        AutocompleteState::Inactive => Vec::new(),
        AutocompleteState::CommandSuggest { matches, .. } => matches
            .iter()
            .map(|name| {
                let label = format!("/{name}");
                match describe.describe(name) {
                    Some(description) if !description.is_empty() => {
                        let padding = DESCRIPTION_COLUMN.saturating_sub(str_width(&label)).max(2);
                        format!("{label}{}{description}", " ".repeat(padding))
                    }
                    _ => label,
                }
            })
            .collect(),
        AutocompleteState::PathSuggest { entries, .. } => entries
            .iter()
            .map(|entry| {
                if entry.is_dir {
                    format!("{}/", entry.name)
                } else {
                    entry.name.clone()
                }
            })
            .collect(),
    };

    labels
        .into_iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(idx, label)| {
            let marker = if idx == selected {
                SELECTED_MARKER
            } else {
                UNSELECTED_MARKER
            };
            truncate_to_width(&format!("{marker}{label}"), max_width)
        })
        .collect()
}
