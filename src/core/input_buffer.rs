//! Editable input line plus the autocomplete and redraw state tied to it.

use crate::core::autocomplete::{apply_completion, next_state, AutocompleteState, CompletionSource};

/// Text being typed at the prompt.
///
/// `cursor_index` counts characters, not bytes, and never exceeds the text length.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    text: Vec<char>,
    cursor_index: usize,
    autocomplete_state: AutocompleteState,
    selected: usize,
    /// Suggestion rows actually drawn by the previous frame.
    pub lines_rendered_prev_frame: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn chars(&self) -> &[char] {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor_index
    }

    pub fn autocomplete_state(&self) -> &AutocompleteState {
        &self.autocomplete_state
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Replaces the whole text and puts the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.cursor_index = self.text.len();
        self.selected = 0;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_index = 0;
        self.selected = 0;
    }

    pub fn insert_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.text.insert(self.cursor_index, ch);
            self.cursor_index += 1;
        }
        self.selected = 0;
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor_index == 0 {
            return false;
        }
        self.cursor_index -= 1;
        self.text.remove(self.cursor_index);
        self.selected = 0;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor_index >= self.text.len() {
            return false;
        }
        self.text.remove(self.cursor_index);
        self.selected = 0;
        true
    }

    pub fn move_left(&mut self) {
        self.cursor_index = self.cursor_index.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor_index = (self.cursor_index + 1).min(self.text.len());
    }

    pub fn move_home(&mut self) {
        self.cursor_index = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_index = self.text.len();
    }

    /// Removes the text before the cursor and returns it.
    pub fn cut_to_start(&mut self) -> String {
        let cut: String = self.text.drain(..self.cursor_index).collect();
        self.cursor_index = 0;
        self.selected = 0;
        cut
    }

    /// Removes the text after the cursor and returns it.
    pub fn cut_to_end(&mut self) -> String {
        let cut: String = self.text.drain(self.cursor_index..).collect();
        self.selected = 0;
        cut
    }

    /// Cuts the word before the cursor along with any whitespace between it and the cursor.
    pub fn cut_word_before(&mut self) -> String {
        let start = self.word_start_before();
        let cut: String = self.text.drain(start..self.cursor_index).collect();
        self.cursor_index = start;
        self.selected = 0;
        cut
    }

    /// Deletes the word after the cursor and the whitespace that follows it.
    pub fn delete_word_after(&mut self) {
        let end = self.word_end_after();
        self.text.drain(self.cursor_index..end);
        self.selected = 0;
    }

    pub fn move_word_left(&mut self) {
        self.cursor_index = self.word_start_before();
    }

    pub fn move_word_right(&mut self) {
        self.cursor_index = self.word_end_after();
    }

    fn word_start_before(&self) -> usize {
        let mut start = self.cursor_index;
        while start > 0 && self.text[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.text[start - 1].is_whitespace() {
            start -= 1;
        }
        start
    }

    fn word_end_after(&self) -> usize {
        let mut end = self.cursor_index;
        while end < self.text.len() && !self.text[end].is_whitespace() {
            end += 1;
        }
        while end < self.text.len() && self.text[end].is_whitespace() {
            end += 1;
        }
        end
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        let count = self.autocomplete_state.candidate_count();
        if count > 0 {
            self.selected = (self.selected + 1).min(count - 1);
        }
    }

    /// Recomputes the autocomplete state from the current text.
    pub fn refresh(&mut self, source: &impl CompletionSource) {
        self.autocomplete_state = next_state(&self.text(), source);
        let count = self.autocomplete_state.candidate_count();
        self.selected = if count == 0 {
            0
        } else {
            self.selected.min(count - 1)
        };
    }

    /// Accepts the selected suggestion. Returns `false` when nothing was suggested.
    pub fn accept_selection(&mut self) -> bool {
        match apply_completion(&self.text(), &self.autocomplete_state, self.selected) {
            Some(text) => {
                self.set_text(&text);
                true
            }
            None => false,
        }
    }

    /// Drops any suggestions so the next frame erases them.
    pub fn dismiss_suggestions(&mut self) {
        self.autocomplete_state = AutocompleteState::Inactive;
        self.selected = 0;
    }
}
