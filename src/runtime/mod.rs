//! Runtime orchestration.

pub mod input_engine;

pub use input_engine::{InputEngine, Submission};
