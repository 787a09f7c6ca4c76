//! Copy job description.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;

/// Default remote directory files are copied to and from.
pub const DEFAULT_REMOTE_ROOT: &str = "/var/tmp";

/// Which way the file travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    /// Local source, remote destination.
    Put,
    /// Remote source, local destination.
    Get,
}

impl FromStr for TransferDirection {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "put" => Ok(TransferDirection::Put),
            "get" => Ok(TransferDirection::Get),
            other => Err(TransferError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::Put => write!(f, "put"),
            TransferDirection::Get => write!(f, "get"),
        }
    }
}

/// Immutable description of a single copy operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransferDescriptor {
    source_file: String,
    dest_file: String,
    #[serde(default = "default_remote_root")]
    remote_root: String,
    direction: TransferDirection,
}

fn default_remote_root() -> String {
    DEFAULT_REMOTE_ROOT.to_string()
}

impl FileTransferDescriptor {
    /// Describe a copy rooted at [`DEFAULT_REMOTE_ROOT`].
    pub fn new(
        source_file: impl Into<String>,
        dest_file: impl Into<String>,
        direction: TransferDirection,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            dest_file: dest_file.into(),
            remote_root: default_remote_root(),
            direction,
        }
    }

    /// Use a different remote root directory.
    pub fn with_remote_root(mut self, remote_root: impl Into<String>) -> Self {
        self.remote_root = remote_root.into();
        self
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn dest_file(&self) -> &str {
        &self.dest_file
    }

    pub fn remote_root(&self) -> &str {
        &self.remote_root
    }

    pub fn direction(&self) -> TransferDirection {
        self.direction
    }

    /// The file on the remote side: the destination for `put`, the source for `get`.
    pub fn remote_file(&self) -> &str {
        match self.direction {
            TransferDirection::Put => &self.dest_file,
            TransferDirection::Get => &self.source_file,
        }
    }

    /// Full remote path of `file` under the remote root.
    pub fn remote_path(&self, file: &str) -> String {
        format!("{}/{}", self.remote_root.trim_end_matches('/'), file)
    }
}
