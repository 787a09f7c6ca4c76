//! File transfer verification.
//!
//! Confirms remote free space, file existence, size and content checksum
//! for a copy job. The copy itself happens elsewhere.

mod descriptor;
pub mod helpers;
mod session;

pub use descriptor::{DEFAULT_REMOTE_ROOT, FileTransferDescriptor, TransferDirection};
pub use helpers::{UnixFileHelpers, UnixHelpers};
pub use session::{
    CHECKSUM_READ_TIMEOUT, DEFAULT_CHECKSUM_COMMAND, FileTransferSession, checksum_pattern,
    parse_checksum,
};
