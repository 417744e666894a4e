//! Core interfaces and types.

pub mod autocomplete;
pub mod input_buffer;
pub mod keys;
pub mod terminal;
