//! Rendering pipeline.

pub mod frame;

pub use frame::{render_frame, DescribeCommand, Frame};
