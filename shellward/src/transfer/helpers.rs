//! Generic Unix file helpers: free space, existence and size checks.
//!
//! Each check runs one shell command on the control channel and parses
//! standard coreutils output. The command can be overridden per call.

use std::future::Future;

use log::debug;

use crate::channel::SessionChannel;
use crate::error::{Result, TransferError};

const NO_SUCH_FILE: &str = "No such file or directory";

/// Remote file checks used by file transfer verification.
pub trait UnixHelpers: Send + Sync {
    /// Bytes available on the file system holding `remote_root`.
    ///
    /// A non-empty `search_pattern` selects the output line containing it.
    fn space_available<C: SessionChannel>(
        &self,
        channel: &mut C,
        remote_root: &str,
        remote_cmd: &str,
        search_pattern: &str,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Whether `file_name` is present in `remote_root`.
    fn file_exists<C: SessionChannel>(
        &self,
        channel: &mut C,
        remote_root: &str,
        file_name: &str,
        remote_cmd: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Size in bytes of the file at `remote_path`.
    fn file_size<C: SessionChannel>(
        &self,
        channel: &mut C,
        remote_path: &str,
        remote_cmd: &str,
    ) -> impl Future<Output = Result<u64>> + Send;
}

/// [`UnixHelpers`] built on `df -k`, `ls` and `ls -l`.
#[derive(Debug, Clone, Default)]
pub struct UnixFileHelpers;

impl UnixHelpers for UnixFileHelpers {
    async fn space_available<C: SessionChannel>(
        &self,
        channel: &mut C,
        remote_root: &str,
        remote_cmd: &str,
        search_pattern: &str,
    ) -> Result<u64> {
        let command = if remote_cmd.is_empty() {
            format!("/bin/df -k {}", remote_root)
        } else {
            remote_cmd.to_string()
        };
        let timeout = channel.read_timeout();
        let output = channel.send_command(&command, timeout).await?;
        debug!("'{}' returned {} bytes", command, output.len());
        parse_df_available(&output, search_pattern)
    }

    async fn file_exists<C: SessionChannel>(
        &self,
        channel: &mut C,
        remote_root: &str,
        file_name: &str,
        remote_cmd: &str,
    ) -> Result<bool> {
        let command = if remote_cmd.is_empty() {
            format!("ls {}", remote_root)
        } else {
            remote_cmd.to_string()
        };
        let timeout = channel.read_timeout();
        let output = channel.send_command(&command, timeout).await?;
        Ok(listing_contains(&output, file_name))
    }

    async fn file_size<C: SessionChannel>(
        &self,
        channel: &mut C,
        remote_path: &str,
        remote_cmd: &str,
    ) -> Result<u64> {
        let command = if remote_cmd.is_empty() {
            format!("ls -l {}", remote_path)
        } else {
            remote_cmd.to_string()
        };
        let timeout = channel.read_timeout();
        let output = channel.send_command(&command, timeout).await?;
        parse_ls_size(&output, remote_path)
    }
}

/// Parse available bytes out of `df -k` output.
///
/// ```text
/// Filesystem     1K-blocks    Used Available Use% Mounted on
/// /dev/sda1       20508240 9016300  10426980  47% /
/// ```
///
/// The first row is used unless `search_pattern` is non-empty, in which case
/// the first row containing it is. Output without the header line is only
/// accepted together with a `search_pattern`.
pub fn parse_df_available(output: &str, search_pattern: &str) -> Result<u64> {
    let space_error = || TransferError::SpaceParse {
        output: output.to_string(),
    };

    let mut rows: Vec<&str> = output.trim().lines().collect();
    let has_header = rows.first().is_some_and(|line| line.starts_with("Filesystem"));
    if has_header {
        let avail_column = rows[0]
            .split_whitespace()
            .nth(3)
            .is_some_and(|col| col.starts_with("Avail"));
        if !avail_column {
            return Err(space_error().into());
        }
        rows.remove(0);
    } else if search_pattern.is_empty() {
        return Err(space_error().into());
    }

    let start = if search_pattern.is_empty() {
        0
    } else {
        rows.iter()
            .position(|line| line.contains(search_pattern))
            .ok_or_else(space_error)?
    };

    // Long device names make df wrap the row, so count tokens across lines.
    let kib: u64 = rows[start..]
        .iter()
        .flat_map(|line| line.split_whitespace())
        .nth(3)
        .ok_or_else(space_error)?
        .parse()
        .map_err(|_| space_error())?;
    Ok(kib * 1024)
}

/// Whether a directory listing names `file_name`.
pub fn listing_contains(output: &str, file_name: &str) -> bool {
    if output.contains(NO_SUCH_FILE) {
        return false;
    }
    output.split_whitespace().any(|entry| {
        entry == file_name || entry.rsplit('/').next() == Some(file_name)
    })
}

/// Parse the size column of `ls -l` output for `remote_path`.
///
/// ```text
/// -rw-r--r-- 1 user user 12 Nov  5 19:07 /var/tmp/a.txt
/// ```
pub fn parse_ls_size(output: &str, remote_path: &str) -> Result<u64> {
    if output.contains(NO_SUCH_FILE) {
        return Err(TransferError::FileNotFound {
            path: remote_path.to_string(),
        }
        .into());
    }

    let size_error = || TransferError::SizeParse {
        file: remote_path.to_string(),
        output: output.to_string(),
    };

    // Listings of a relative name only carry the file name.
    let file_name = remote_path.rsplit('/').next().unwrap_or(remote_path);
    let line = output
        .lines()
        .find(|line| line.contains(remote_path))
        .or_else(|| {
            output
                .lines()
                .find(|line| line.split_whitespace().any(|field| field == file_name))
        })
        .ok_or_else(size_error)?;

    let size = line
        .split_whitespace()
        .nth(4)
        .and_then(|field| field.parse().ok())
        .ok_or_else(size_error)?;
    Ok(size)
}
