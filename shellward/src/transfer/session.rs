//! Verification side of a Linux file copy.

use std::time::Duration;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use super::descriptor::FileTransferDescriptor;
use super::helpers::{UnixFileHelpers, UnixHelpers};
use crate::channel::SessionChannel;
use crate::error::{Error, Result, TransferError};

/// Checksum runs over large files are slow; allow them this long.
pub const CHECKSUM_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Default checksum tool.
pub const DEFAULT_CHECKSUM_COMMAND: &str = "md5sum";

static LEADING_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+)\s+").expect("checksum pattern is valid"));

/// Extract the hash from checksum tool output (`<hash>  <filename>`).
///
/// `pattern` overrides the default leading-token pattern; its first capture
/// group is the hash.
pub fn parse_checksum(raw_output: &str, pattern: Option<&Regex>) -> Result<String> {
    let pattern = pattern.unwrap_or(&LEADING_TOKEN);
    let trimmed = raw_output.trim_start();

    pattern
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| {
            TransferError::ChecksumParse {
                output: raw_output.to_string(),
            }
            .into()
        })
}

/// File transfer verification against a Linux host.
///
/// Borrows the control channel for as long as it lives, so no other
/// command can interleave with a verification step.
pub struct FileTransferSession<'a, C, H = UnixFileHelpers> {
    channel: &'a mut C,
    descriptor: FileTransferDescriptor,
    helpers: H,
}

impl<'a, C: SessionChannel> FileTransferSession<'a, C> {
    /// Verify `descriptor` over `channel` with the coreutils helpers.
    pub fn new(channel: &'a mut C, descriptor: FileTransferDescriptor) -> Self {
        Self::with_helpers(channel, descriptor, UnixFileHelpers)
    }
}

impl<'a, C: SessionChannel, H: UnixHelpers> FileTransferSession<'a, C, H> {
    /// Verify `descriptor` with a custom helper set.
    pub fn with_helpers(channel: &'a mut C, descriptor: FileTransferDescriptor, helpers: H) -> Self {
        Self {
            channel,
            descriptor,
            helpers,
        }
    }

    /// The copy job being verified.
    pub fn descriptor(&self) -> &FileTransferDescriptor {
        &self.descriptor
    }

    /// Bytes free on the remote file system.
    pub async fn remote_space_available(
        &mut self,
        remote_cmd: &str,
        search_pattern: &str,
    ) -> Result<u64> {
        self.helpers
            .space_available(
                &mut *self.channel,
                self.descriptor.remote_root(),
                remote_cmd,
                search_pattern,
            )
            .await
    }

    /// Whether the remote file already exists.
    pub async fn remote_file_exists(&mut self, remote_cmd: &str) -> Result<bool> {
        self.helpers
            .file_exists(
                &mut *self.channel,
                self.descriptor.remote_root(),
                self.descriptor.remote_file(),
                remote_cmd,
            )
            .await
    }

    /// Size in bytes of the remote file, or of `remote_file` when given.
    pub async fn remote_file_size(
        &mut self,
        remote_cmd: &str,
        remote_file: Option<&str>,
    ) -> Result<u64> {
        let file = remote_file.unwrap_or_else(|| self.descriptor.remote_file());
        let path = self.descriptor.remote_path(file);
        self.helpers
            .file_size(&mut *self.channel, &path, remote_cmd).await
    }

    /// Checksum of the remote file computed on the remote host.
    ///
    /// Runs `<base_command> <remote_root>/<remote_file>`.
    pub async fn remote_checksum(
        &mut self,
        base_command: &str,
        remote_file: Option<&str>,
    ) -> Result<String> {
        let file = remote_file.unwrap_or_else(|| self.descriptor.remote_file());
        let command = format!("{} {}", base_command, self.descriptor.remote_path(file));

        debug!("computing remote checksum: {}", command);
        let output = self
            .channel
            .send_command(&command, CHECKSUM_READ_TIMEOUT)
            .await?;

        let hash = parse_checksum(&output, None)?;
        Ok(hash.trim().to_string())
    }

    /// Compare the remote checksum with a locally computed one.
    pub async fn compare_checksum(&mut self, local_hash: &str) -> Result<bool> {
        let remote = self.remote_checksum(DEFAULT_CHECKSUM_COMMAND, None).await?;
        let matched = remote.eq_ignore_ascii_case(local_hash.trim());
        info!(
            "checksum for {} {}",
            self.descriptor.remote_file(),
            if matched { "matches" } else { "differs" }
        );
        Ok(matched)
    }

    /// Turn on the remote copy service.
    pub async fn enable_remote_copy_feature(&mut self) -> Result<()> {
        Err(Error::Unsupported {
            operation: "enable_remote_copy_feature",
        })
    }

    /// Turn off the remote copy service.
    pub async fn disable_remote_copy_feature(&mut self) -> Result<()> {
        Err(Error::Unsupported {
            operation: "disable_remote_copy_feature",
        })
    }
}

/// Compile a caller-supplied checksum extraction pattern.
pub fn checksum_pattern(pattern: &str) -> Result<Regex> {
    let regex = Regex::new(pattern).map_err(TransferError::InvalidPattern)?;
    Ok(regex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::ScriptedChannel;
    use crate::transfer::TransferDirection;
    use tokio_test::{assert_err, assert_ok};

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn put_descriptor() -> FileTransferDescriptor {
        FileTransferDescriptor::new("local.txt", "a.txt", TransferDirection::Put)
    }

    #[test]
    fn test_parse_checksum() {
        let hash = parse_checksum("d41d8cd98f00b204e9800998ecf8427e  file.bin", None).unwrap();
        assert_eq!(hash, EMPTY_MD5);
    }

    #[test]
    fn test_parse_checksum_surrounding_whitespace() {
        let hash = parse_checksum("\n  d41d8cd98f00b204e9800998ecf8427e  /var/tmp/a.txt\n", None)
            .unwrap();
        assert_eq!(hash, EMPTY_MD5);
    }

    #[test]
    fn test_parse_checksum_custom_pattern() {
        let pattern = checksum_pattern(r"SHA256 \(.*\) = (\w+)").unwrap();
        let hash = parse_checksum("SHA256 (a.txt) = abc123", Some(&pattern)).unwrap();
        assert_eq!(hash, "abc123");
    }

    #[test]
    fn test_checksum_pattern_invalid() {
        let err = checksum_pattern(r"(\w+").unwrap_err();
        assert!(matches!(
            err,
            Error::Transfer(TransferError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_parse_checksum_rejects_garbage() {
        let err = parse_checksum("md5sum:", None).unwrap_err();
        assert!(matches!(
            err,
            Error::Transfer(TransferError::ChecksumParse { .. })
        ));
    }

    #[tokio::test]
    async fn test_remote_checksum_command_and_timeout() {
        let mut channel =
            ScriptedChannel::new().command_output(&format!("{}  /var/tmp/a.txt", EMPTY_MD5));
        let mut transfer = FileTransferSession::new(&mut channel, put_descriptor());

        let hash = transfer.remote_checksum("md5sum", None).await.unwrap();
        assert_eq!(hash, EMPTY_MD5);
        assert_eq!(
            channel.commands,
            vec![("md5sum /var/tmp/a.txt".to_string(), CHECKSUM_READ_TIMEOUT)]
        );
    }

    #[tokio::test]
    async fn test_remote_checksum_get_uses_source_file() {
        let mut channel = ScriptedChannel::new().command_output("abc  /srv/remote.img");
        let descriptor = FileTransferDescriptor::new("remote.img", "local.img", TransferDirection::Get)
            .with_remote_root("/srv");
        let mut transfer = FileTransferSession::new(&mut channel, descriptor);

        assert_eq!(transfer.remote_checksum("sha256sum", None).await.unwrap(), "abc");
        assert_eq!(channel.commands[0].0, "sha256sum /srv/remote.img");
    }

    #[tokio::test]
    async fn test_remote_checksum_override_file() {
        let mut channel = ScriptedChannel::new().command_output("abc  /var/tmp/other.txt");
        let mut transfer = FileTransferSession::new(&mut channel, put_descriptor());

        assert_ok!(transfer.remote_checksum("md5sum", Some("other.txt")).await);
        assert_eq!(channel.commands[0].0, "md5sum /var/tmp/other.txt");
    }

    #[tokio::test]
    async fn test_compare_checksum() {
        let mut channel = ScriptedChannel::new()
            .command_output(&format!("{}  /var/tmp/a.txt", EMPTY_MD5))
            .command_output(&format!("{}  /var/tmp/a.txt", EMPTY_MD5));
        let mut transfer = FileTransferSession::new(&mut channel, put_descriptor());

        assert!(transfer.compare_checksum(&EMPTY_MD5.to_uppercase()).await.unwrap());
        assert!(!transfer.compare_checksum("0000").await.unwrap());
    }

    #[tokio::test]
    async fn test_remote_file_checks_use_descriptor() {
        let mut channel = ScriptedChannel::new()
            .command_output("Filesystem 1K-blocks Used Available Use% Mounted on\n/dev/sda1 100 50 50 50% /")
            .command_output("a.txt  other.txt")
            .command_output("-rw-r--r-- 1 user user 12 Nov  5 19:07 /var/tmp/a.txt");
        let mut transfer = FileTransferSession::new(&mut channel, put_descriptor());

        assert_eq!(transfer.remote_space_available("", "").await.unwrap(), 50 * 1024);
        assert!(transfer.remote_file_exists("").await.unwrap());
        assert_eq!(transfer.remote_file_size("", None).await.unwrap(), 12);

        let commands: Vec<&str> = channel.commands.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(
            commands,
            vec!["/bin/df -k /var/tmp", "ls /var/tmp", "ls -l /var/tmp/a.txt"]
        );
    }

    #[tokio::test]
    async fn test_copy_feature_toggles_unsupported() {
        let mut channel = ScriptedChannel::new();
        let mut transfer = FileTransferSession::new(&mut channel, put_descriptor());

        let err = assert_err!(transfer.enable_remote_copy_feature().await);
        assert!(matches!(err, Error::Unsupported { .. }));
        let err = assert_err!(transfer.disable_remote_copy_feature().await);
        assert!(matches!(err, Error::Unsupported { .. }));
        assert!(channel.writes.is_empty());
        assert!(channel.commands.is_empty());
    }
}
