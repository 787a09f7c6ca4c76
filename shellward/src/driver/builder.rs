//! Builder for connected shell sessions.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use secrecy::SecretString;

use super::linux::LinuxSession;
use crate::channel::{PtyChannel, PtyConfig};
use crate::error::{DriverError, Result};
use crate::platform::{ElevateOptions, PromptTerminators};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig, SshTransport};

/// Builder for a [`LinuxSession`] over SSH.
///
/// # Example
///
/// ```rust,no_run
/// use shellward::SessionBuilder;
///
/// # async fn example() -> Result<(), shellward::Error> {
/// let session = SessionBuilder::new("192.168.1.10")
///     .username("admin")
///     .password("secret")
///     .delay_factor(2.0)
///     .connect()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    secret: Option<SecretString>,
    timeout: Duration,
    delay_factor: f64,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    terminators: Option<PromptTerminators>,
    elevate_options: ElevateOptions,
}

impl SessionBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            secret: None,
            timeout: Duration::from_secs(30),
            delay_factor: 1.0,
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            terminators: None,
            elevate_options: ElevateOptions::default(),
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Set the credential answered to the elevation prompt.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set the connect and read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Scale every fixed delay, for slow links or loaded hosts.
    pub fn delay_factor(mut self, factor: f64) -> Self {
        self.delay_factor = factor;
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Override the process-wide prompt terminators.
    pub fn terminators(mut self, terminators: PromptTerminators) -> Self {
        self.terminators = Some(terminators);
        self
    }

    /// Elevation settings used for command batches.
    pub fn elevate_options(mut self, options: ElevateOptions) -> Self {
        self.elevate_options = options;
        self
    }

    fn ssh_config(&self) -> Result<SshConfig> {
        let username = self.username.clone().ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;
        if !(self.delay_factor.is_finite() && self.delay_factor >= 0.0) {
            return Err(DriverError::InvalidConfig {
                message: format!("Invalid delay factor {}", self.delay_factor),
            }
            .into());
        }

        Ok(SshConfig {
            host: self.host.clone(),
            port: self.port,
            username,
            auth: self.auth.clone(),
            timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification.clone(),
            known_hosts_path: self.known_hosts_path.clone(),
        })
    }

    /// Connect, authenticate and open the shell channel.
    ///
    /// The returned session has not discovered its prompt yet; call
    /// `prepare` and `refresh_base_prompt` next.
    pub async fn connect(self) -> Result<LinuxSession<PtyChannel>> {
        let ssh_config = self.ssh_config()?;
        let username = ssh_config.username.clone();

        let transport = SshTransport::connect(ssh_config).await?;
        let channel = PtyChannel::open(
            transport,
            PtyConfig {
                timeout: self.timeout,
                delay_factor: self.delay_factor,
                ..PtyConfig::default()
            },
        )
        .await?;
        debug!("session ready for '{}'", username);

        let mut session =
            LinuxSession::new(channel, username).with_elevate_options(self.elevate_options);
        if let Some(secret) = self.secret {
            session = session.with_secret(secret);
        }
        if let Some(terminators) = self.terminators {
            session = session.with_terminators(terminators);
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_username_required() {
        let err = SessionBuilder::new("host").ssh_config().unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_invalid_delay_factor() {
        let err = SessionBuilder::new("host")
            .username("user")
            .delay_factor(-1.0)
            .ssh_config()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_ssh_config() {
        let config = SessionBuilder::new("10.0.0.1")
            .port(2222)
            .username("deploy")
            .password("pw")
            .terminal_size(200, 50)
            .host_key_verification(HostKeyVerification::Disabled)
            .ssh_config()
            .unwrap();
        assert_eq!(config.socket_addr(), "10.0.0.1:2222");
        assert_eq!(config.username, "deploy");
        assert_eq!(config.terminal_width, 200);
        assert!(matches!(config.auth, AuthMethod::Password(_)));
        assert!(matches!(
            config.host_key_verification,
            HostKeyVerification::Disabled
        ));
    }
}
