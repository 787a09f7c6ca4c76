//! Channel layer: the session channel capability and its SSH PTY backing.
//!
//! This module handles reading and writing the interactive shell,
//! including tail-only prompt matching and ANSI stripping.

mod buffer;
#[cfg(test)]
pub(crate) mod mock;
pub mod patterns;
mod pty;
mod session;

pub use buffer::PatternBuffer;
pub use pty::{PtyChannel, PtyConfig};
pub use session::{SessionChannel, normalize_output};
