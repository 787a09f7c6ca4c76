//! Two-state privilege tracking.

use std::fmt;

/// Privilege state of a shell session, derived from its prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegeLevel {
    /// Regular user shell.
    Unprivileged,

    /// Superuser shell.
    Privileged,
}

impl PrivilegeLevel {
    /// Derive the level from a prompt and the elevated terminator.
    pub fn from_prompt(prompt: &str, elevated_terminator: &str) -> Self {
        if !elevated_terminator.is_empty() && prompt.ends_with(elevated_terminator) {
            PrivilegeLevel::Privileged
        } else {
            PrivilegeLevel::Unprivileged
        }
    }

    /// Whether this is the superuser level.
    pub fn is_privileged(self) -> bool {
        self == PrivilegeLevel::Privileged
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivilegeLevel::Unprivileged => write!(f, "unprivileged"),
            PrivilegeLevel::Privileged => write!(f, "privileged"),
        }
    }
}
