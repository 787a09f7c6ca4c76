//! Error types for shellward.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for shellward operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors (prompt tracking, privilege elevation)
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// File transfer verification errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// The target has no equivalent for the requested operation
    #[error("Operation '{operation}' is not supported on this target")]
    Unsupported { operation: &'static str },
}

impl Error {
    /// Whether this error is a channel or transport read timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::PatternTimeout(_))
                | Error::Transport(TransportError::Timeout(_))
        )
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Server presented a host key that is not in known_hosts (strict mode)
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// Server host key differs from the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session-level errors raised by prompt discovery and privilege changes.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Channel read did not return the expected data while changing privilege
    #[error("Timed-out reading channel, data not available")]
    SessionTimeout,

    /// Elevation did not reach the superuser prompt
    #[error("Failed to enter elevated mode: {message}")]
    PermissionDenied { message: String },

    /// De-elevation left the session in the elevated state
    #[error("Failed to exit elevated mode; session state is unsafe: prompt '{prompt}'")]
    FatalState { prompt: String },

    /// The refreshed prompt did not end in a configured terminator
    #[error("Prompt not found: '{prompt}'")]
    PromptNotFound { prompt: String },

    /// Invalid configuration in the session builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// File transfer verification errors.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Checksum tool output did not contain a hash
    #[error("Invalid output from checksum command: '{output}'")]
    ChecksumParse { output: String },

    /// Free-space output could not be interpreted
    #[error("Unable to parse free space from: '{output}'")]
    SpaceParse { output: String },

    /// File listing did not contain a usable size
    #[error("Unable to parse size of '{file}' from: '{output}'")]
    SizeParse { file: String, output: String },

    /// Remote file is missing
    #[error("Remote file not found: {path}")]
    FileNotFound { path: String },

    /// Caller-supplied extraction pattern does not compile
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(regex::Error),

    /// Unrecognized transfer direction
    #[error("Invalid transfer direction '{0}', expected 'put' or 'get'")]
    InvalidDirection(String),
}

/// Result type alias using shellward's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout() {
        let err: Error = ChannelError::PatternTimeout(Duration::from_secs(1)).into();
        assert!(err.is_timeout());

        let err: Error = TransportError::Timeout(Duration::from_secs(1)).into();
        assert!(err.is_timeout());

        let err: Error = ChannelError::Closed.into();
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_unsupported_message() {
        let err = Error::Unsupported {
            operation: "save_configuration",
        };
        assert_eq!(
            err.to_string(),
            "Operation 'save_configuration' is not supported on this target"
        );
    }
}
