//! Platform definitions.
//!
//! Target-specific prompt terminators, privilege levels and the option
//! values that drive elevation.

pub mod linux;
mod privilege_level;

pub use linux::{CredentialPrompt, ElevateOptions, PromptOptions, PromptTerminators, SUPERUSER};
pub use privilege_level::PrivilegeLevel;
