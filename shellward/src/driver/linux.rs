//! Linux shell session with sudo-based privilege elevation.

use std::time::Duration;

use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use super::ShellSession;
use crate::channel::SessionChannel;
use crate::channel::patterns::{last_line, terminator_pattern};
use crate::error::{ChannelError, DriverError, Error, Result};
use crate::platform::linux::DEFAULT_EXIT_COMMAND;
use crate::platform::{
    ElevateOptions, PrivilegeLevel, PromptOptions, PromptTerminators, SUPERUSER,
};

/// Base wait between writing an elevation command and reading its output.
const ELEVATE_DELAY: Duration = Duration::from_millis(300);

/// Base wait between the prompt-refresh keystroke and the read.
const PROMPT_DELAY: Duration = Duration::from_millis(100);

/// Neutral keystroke used to make the shell reprint its prompt.
const RETURN: &str = "\n";

/// Aborts a pending credential prompt.
const INTERRUPT: &str = "\x03";

/// Interactive Linux shell session.
///
/// Owns its channel exclusively. Privilege state is never stored on its own:
/// it is always derived from the last base prompt, which only
/// [`refresh_base_prompt`](ShellSession::refresh_base_prompt) updates.
///
/// # Example
///
/// ```rust,no_run
/// use shellward::{SessionBuilder, ShellSession};
/// use shellward::platform::{ElevateOptions, PromptOptions};
///
/// # async fn example() -> Result<(), shellward::Error> {
/// let mut session = SessionBuilder::new("192.168.1.10")
///     .username("admin")
///     .password("login-secret")
///     .secret("sudo-secret")
///     .connect()
///     .await?;
///
/// session.prepare().await?;
/// session.refresh_base_prompt(&PromptOptions::default()).await?;
/// session.elevate(&ElevateOptions::default()).await?;
/// assert!(session.is_elevated());
/// # Ok(())
/// # }
/// ```
pub struct LinuxSession<C> {
    channel: C,
    username: String,
    secret: Option<SecretString>,
    terminators: PromptTerminators,
    elevate_options: ElevateOptions,
    base_prompt: String,
}

impl<C: SessionChannel> LinuxSession<C> {
    /// Wrap an open channel logged in as `username`.
    pub fn new(mut channel: C, username: impl Into<String>) -> Self {
        let terminators = PromptTerminators::global().clone();
        channel.set_terminators(&terminators);

        Self {
            channel,
            username: username.into(),
            secret: None,
            terminators,
            elevate_options: ElevateOptions::default(),
            base_prompt: String::new(),
        }
    }

    /// Set the credential written when elevation asks for one.
    pub fn with_secret(mut self, secret: SecretString) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Override the process-wide prompt terminators for this session.
    pub fn with_terminators(mut self, terminators: PromptTerminators) -> Self {
        self.channel.set_terminators(&terminators);
        self.terminators = terminators;
        self
    }

    /// Elevation settings used by [`send_command_batch`](ShellSession::send_command_batch).
    pub fn with_elevate_options(mut self, options: ElevateOptions) -> Self {
        self.elevate_options = options;
        self
    }

    /// The last discovered prompt, trimmed.
    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    /// The login identity.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether the login identity is the superuser.
    pub fn is_superuser(&self) -> bool {
        self.username == SUPERUSER
    }

    /// Privilege level derived from the base prompt.
    pub fn privilege_level(&self) -> PrivilegeLevel {
        PrivilegeLevel::from_prompt(&self.base_prompt, &self.terminators.elevated)
    }

    /// Terminators in effect for this session.
    pub fn terminators(&self) -> &PromptTerminators {
        &self.terminators
    }

    /// Borrow the channel, e.g. to run a file transfer verification on it.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give up the session and return its channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            primary: self.terminators.primary.clone(),
            alternate: self.terminators.alternate.clone(),
            delay_factor: 1.0,
            pattern: None,
        }
    }

    /// Write the elevation command, answer the credential prompt, refresh.
    async fn run_elevation(&mut self, options: &ElevateOptions) -> Result<String> {
        self.channel
            .write_channel(&format!("{}{}", options.command, RETURN))
            .await?;
        self.channel.scaled_delay(ELEVATE_DELAY).await;

        let mut output = self.channel.read_channel().await?;
        if options.credential_prompt.is_match(&output) {
            let line = self
                .secret
                .as_ref()
                .map(|secret| format!("{}{}", secret.expose_secret(), RETURN));
            let Some(line) = line else {
                warn!("credential prompt detected but no secret is configured");
                return self.abort_elevation("no elevation secret is configured").await;
            };

            debug!("credential prompt detected, sending ********");
            self.channel.write_channel(&line).await?;
            self.channel.scaled_delay(ELEVATE_DELAY).await;

            // Consume the reply so its prompt is not mistaken for the refreshed one.
            let reply = self.channel.read_channel().await?;
            if options.credential_prompt.is_match(&reply) {
                warn!("elevation credential rejected");
                return self.abort_elevation("the elevation secret was rejected").await;
            }

            output.push_str(&reply);
            if let Some(pattern) = &options.enable_pattern {
                if !pattern.is_match(reply.as_bytes()) {
                    let timeout = self.channel.read_timeout();
                    let rest = self.channel.read_until_pattern(pattern, timeout).await?;
                    output.push_str(&rest);
                }
            }
        }

        let options = self.prompt_options();
        self.refresh_base_prompt(&options).await?;
        Ok(output)
    }

    /// Cancel a pending credential prompt and fail the elevation.
    async fn abort_elevation(&mut self, reason: &str) -> Result<String> {
        self.channel.write_channel(INTERRUPT).await?;
        let options = self.prompt_options();
        self.refresh_base_prompt(&options).await?;

        Err(DriverError::PermissionDenied {
            message: format!("{}; prompt is '{}'", reason, self.base_prompt),
        }
        .into())
    }

    async fn run_de_elevation(&mut self, command: &str) -> Result<()> {
        self.channel
            .write_channel(&format!("{}{}", command, RETURN))
            .await?;
        self.channel.scaled_delay(ELEVATE_DELAY).await;

        let options = self.prompt_options();
        self.refresh_base_prompt(&options).await?;
        Ok(())
    }
}

/// Re-signal a channel read timeout as a session timeout.
fn session_timeout(err: Error) -> Error {
    if err.is_timeout() {
        DriverError::SessionTimeout.into()
    } else {
        err
    }
}

impl<C: SessionChannel> ShellSession for LinuxSession<C> {
    async fn prepare(&mut self) -> Result<()> {
        self.channel.set_ansi_stripping(true);
        Ok(())
    }

    async fn suppress_paging(&mut self) -> Result<String> {
        // Linux shells do not page.
        Ok(String::new())
    }

    async fn refresh_base_prompt(&mut self, options: &PromptOptions) -> Result<String> {
        let pattern = match &options.pattern {
            Some(pattern) => pattern.clone(),
            None => terminator_pattern(&options.primary, &options.alternate)
                .map_err(ChannelError::from)?,
        };

        self.channel.write_channel(RETURN).await?;
        self.channel
            .scaled_delay(PROMPT_DELAY.mul_f64(options.delay_factor.max(0.0)))
            .await;

        // Everything already queued is older than the prompt we asked for.
        let mut output = self.channel.read_channel().await?;
        if !pattern.is_match(output.as_bytes()) {
            let timeout = self.channel.read_timeout();
            output.push_str(&self.channel.read_until_pattern(&pattern, timeout).await?);
        }
        let prompt = last_line(&output).to_string();

        let terminated = prompt.ends_with(options.primary.as_str())
            || (!options.alternate.is_empty() && prompt.ends_with(options.alternate.as_str()));
        if prompt.is_empty() || (options.pattern.is_none() && !terminated) {
            return Err(DriverError::PromptNotFound { prompt }.into());
        }

        self.channel.set_base_prompt(&prompt)?;
        self.base_prompt = prompt;
        debug!(
            "base prompt '{}' ({})",
            self.base_prompt,
            self.privilege_level()
        );

        Ok(self.base_prompt.clone())
    }

    fn is_elevated_with(&self, check: &str) -> bool {
        !check.is_empty() && self.base_prompt.ends_with(check)
    }

    fn is_elevated(&self) -> bool {
        self.privilege_level().is_privileged()
    }

    async fn elevate(&mut self, options: &ElevateOptions) -> Result<String> {
        if self.is_elevated() {
            return Ok(String::new());
        }

        debug!("elevating with '{}'", options.command);
        let output = self.run_elevation(options).await.map_err(session_timeout)?;

        if !self.is_elevated() {
            return Err(DriverError::PermissionDenied {
                message: format!(
                    "prompt '{}' is not elevated; ensure the elevation secret is supplied",
                    self.base_prompt
                ),
            }
            .into());
        }

        info!("elevated to {}", PrivilegeLevel::Privileged);
        Ok(output)
    }

    async fn de_elevate(&mut self, command: &str) -> Result<String> {
        if !self.is_elevated() {
            return Ok(String::new());
        }

        debug!("dropping privilege with '{}'", command);
        self.run_de_elevation(command)
            .await
            .map_err(session_timeout)?;

        if self.is_elevated() {
            return Err(DriverError::FatalState {
                prompt: self.base_prompt.clone(),
            }
            .into());
        }

        info!("returned to {}", PrivilegeLevel::Unprivileged);
        Ok(String::new())
    }

    async fn send_command_batch(
        &mut self,
        commands: &[&str],
        exit_command_mode: bool,
    ) -> Result<String> {
        // There is nothing to drop to from a root login.
        let exit_command_mode = exit_command_mode && !self.is_superuser();

        let elevate_options = self.elevate_options.clone();
        let mut output = self.enter_command_mode(&elevate_options).await?;

        let timeout = self.channel.read_timeout();
        for command in commands {
            let result = self.channel.send_command(command, timeout).await?;
            if !result.is_empty() {
                output.push_str(&result);
                output.push('\n');
            }
        }

        if exit_command_mode {
            output.push_str(&self.exit_command_mode(DEFAULT_EXIT_COMMAND).await?);
        }

        Ok(output)
    }

    async fn cleanup(&mut self, command: &str) -> Result<()> {
        let logout = self
            .channel
            .write_channel(&format!("{}{}", command, RETURN))
            .await;
        if let Err(e) = &logout {
            warn!("logout write failed: {}", e);
        }

        let close = self.channel.close().await;
        logout.and(close)
    }

    async fn save_configuration(&mut self) -> Result<String> {
        Err(Error::Unsupported {
            operation: "save_configuration",
        })
    }
}
