//! Autocomplete state machine for slash commands and `@` paths.
//!
//! Invariant: a suggestion-bearing state never holds an empty candidate list. The only way to
//! build one is through [`NonEmpty::new`], so an empty match set can only ever become
//! [`AutocompleteState::Inactive`].

use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Upper bound on suggestion rows drawn below the input line.
pub const MAX_SUGGESTION_LINES: usize = 8;

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Where suggestion candidates come from.
pub trait CompletionSource {
    /// Registered slash-command names, in registration order.
    fn command_names(&self) -> Vec<String>;

    /// One-line description shown next to a command suggestion.
    fn command_description(&self, _name: &str) -> Option<String> {
        None
    }

    /// Lists `relative_dir` (resolved against the working directory) sorted by name.
    ///
    /// Returns `None` when the directory does not exist or lies outside the working directory.
    fn list_dir(&self, relative_dir: &str) -> Option<Vec<DirEntry>>;
}

/// A candidate list that is guaranteed to hold at least one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmpty<T>(Vec<T>);

impl<T> NonEmpty<T> {
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self(items))
        }
    }
}

impl<T> Deref for NonEmpty<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AutocompleteState {
    #[default]
    Inactive,
    CommandSuggest {
        prefix: String,
        matches: NonEmpty<String>,
    },
    PathSuggest {
        prefix: String,
        entries: NonEmpty<DirEntry>,
    },
}

impl AutocompleteState {
    fn commands(prefix: &str, matches: Vec<String>) -> Self {
        match NonEmpty::new(matches) {
            Some(matches) => Self::CommandSuggest {
                prefix: prefix.to_string(),
                matches,
            },
            None => Self::Inactive,
        }
    }

    fn paths(prefix: &str, entries: Vec<DirEntry>) -> Self {
        match NonEmpty::new(entries) {
            Some(entries) => Self::PathSuggest {
                prefix: prefix.to_string(),
                entries,
            },
            None => Self::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Number of candidates held by the state.
    pub fn candidate_count(&self) -> usize {
        match self {
            Self::Inactive => 0,
            Self::CommandSuggest { matches, .. } => matches.len(),
            Self::PathSuggest { entries, .. } => entries.len(),
        }
    }

    /// Rows the renderer draws for this state.
    pub fn suggestion_lines(&self) -> usize {
        self.candidate_count().min(MAX_SUGGESTION_LINES)
    }
}

/// Computes the autocomplete state for `text`.
///
/// The result depends only on `text` and the source. Neither the previous state nor earlier
/// input is consulted, so there is no keystroke history to go stale.
pub fn next_state(text: &str, source: &impl CompletionSource) -> AutocompleteState {
    if let Some(rest) = text.strip_prefix('/') {
        let token = command_token(rest);
        let matches = source
            .command_names()
            .into_iter()
            .filter(|name| name.starts_with(token))
            .collect();
        return AutocompleteState::commands(token, matches);
    }

    if let Some(at) = text.rfind('@') {
        let typed = &text[at + 1..];
        return AutocompleteState::paths(typed, path_candidates(typed, source));
    }

    AutocompleteState::Inactive
}

fn command_token(rest: &str) -> &str {
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    &rest[..end]
}

/// Splits a typed path into its directory part (with trailing `/`) and final segment.
fn split_typed_path(typed: &str) -> (&str, &str) {
    match typed.rfind('/') {
        Some(idx) => (&typed[..=idx], &typed[idx + 1..]),
        None => ("", typed),
    }
}

fn path_candidates(typed: &str, source: &impl CompletionSource) -> Vec<DirEntry> {
    let (dir, segment) = split_typed_path(typed);
    let listing_dir = if dir.is_empty() { "." } else { dir };
    let Some(entries) = source.list_dir(listing_dir) else {
        return Vec::new();
    };

    // A complete directory path has an empty segment, so its whole listing is shown at once.
    let show_hidden = segment.starts_with('.');
    entries
        .into_iter()
        .filter(|entry| entry.name.starts_with(segment))
        .filter(|entry| show_hidden || !entry.name.starts_with('.'))
        .collect()
}

/// Rewrites `text` so the candidate at `index` replaces the token being completed.
///
/// Directories complete with a trailing `/`, which makes the next evaluation list their
/// contents. Files and commands complete with a trailing space.
pub fn apply_completion(text: &str, state: &AutocompleteState, index: usize) -> Option<String> {
    match state {
        AutocompleteState::Inactive => None,
        AutocompleteState::CommandSuggest { matches, .. } => {
            let name = matches.get(index)?;
            let rest = text.strip_prefix('/')?;
            let after_token = &rest[command_token(rest).len()..];
            if after_token.is_empty() {
                Some(format!("/{name} "))
            } else {
                Some(format!("/{name}{after_token}"))
            }
        }
        AutocompleteState::PathSuggest { entries, .. } => {
            let entry = entries.get(index)?;
            let at = text.rfind('@')?;
            let (dir, _) = split_typed_path(&text[at + 1..]);
            let suffix = if entry.is_dir { "/" } else { " " };
            Some(format!("{}@{dir}{}{suffix}", &text[..at], entry.name))
        }
    }
}
