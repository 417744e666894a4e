//! Terminal input engine for the loo coding agent.
//!
//! Invariant: the number of suggestion rows erased by a redraw is always the number the previous
//! redraw actually drew, never a value recomputed from the current state.
//!
//! # Public API Overview
//! - Compute suggestions with [`next_state`] over a [`CompletionSource`].
//! - Edit text with [`InputBuffer`] and render it with [`render_frame`].
//! - Drive a whole prompt with [`InputEngine`] over any [`Terminal`].

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;

/// Autocomplete state machine and its candidate source.
pub use crate::core::autocomplete::{
    apply_completion, next_state, AutocompleteState, CompletionSource, DirEntry, NonEmpty,
    MAX_SUGGESTION_LINES,
};

/// Editable prompt state.
pub use crate::core::input_buffer::InputBuffer;

/// Keyboard decoding.
pub use crate::core::keys::{InputEvent, Key, KeyDecoder, DEFAULT_ESCAPE_TIMEOUT};

/// Terminal interfaces and process-backed implementation.
pub use crate::core::terminal::{ReadOutcome, Terminal, TerminalGuard};
#[cfg(unix)]
pub use crate::platform::process_terminal::ProcessTerminal;

/// Frame rendering.
pub use crate::render::frame::{render_frame, DescribeCommand, Frame};

/// Keystroke loop.
pub use crate::runtime::input_engine::{InputEngine, Submission};
