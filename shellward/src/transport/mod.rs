//! SSH transport layer wrapping russh.
//!
//! Opens the connection, authenticates, and hands out the PTY shell
//! channel that the session layer drives.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
