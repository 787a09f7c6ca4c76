//! Session drivers.
//!
//! The driver layer owns prompt state and the privilege state machine
//! on top of a [`SessionChannel`](crate::channel::SessionChannel).

mod builder;
mod linux;

pub use builder::SessionBuilder;
pub use linux::LinuxSession;

use std::future::Future;

use crate::error::Result;
use crate::platform::{ElevateOptions, PromptOptions};

/// Privilege-aware interactive shell session, implemented per target platform.
pub trait ShellSession: Send {
    /// Prepare a freshly opened channel (escape handling, no elevation).
    fn prepare(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Disable output paging.
    fn suppress_paging(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Discover the current prompt and store it as the base prompt.
    ///
    /// This is the only operation that changes the tracked privilege state.
    fn refresh_base_prompt(
        &mut self,
        options: &PromptOptions,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Whether the last known base prompt ends with `check`.
    ///
    /// Reads cached state only; call [`refresh_base_prompt`](Self::refresh_base_prompt)
    /// first when a fresh answer is needed.
    fn is_elevated_with(&self, check: &str) -> bool;

    /// [`is_elevated_with`](Self::is_elevated_with) the platform's elevated terminator.
    fn is_elevated(&self) -> bool;

    /// Acquire superuser privilege. A no-op when already privileged.
    fn elevate(&mut self, options: &ElevateOptions) -> impl Future<Output = Result<String>> + Send;

    /// Drop superuser privilege with a single `command`. A no-op when unprivileged.
    fn de_elevate(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Run `commands` with configuration access, leaving it afterwards when
    /// `exit_command_mode` is set and the platform allows it.
    fn send_command_batch(
        &mut self,
        commands: &[&str],
        exit_command_mode: bool,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Best-effort graceful logout followed by channel teardown.
    fn cleanup(&mut self, command: &str) -> impl Future<Output = Result<()>> + Send;

    /// Persist the running configuration.
    fn save_configuration(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Enter configuration (command) mode.
    fn enter_command_mode(
        &mut self,
        options: &ElevateOptions,
    ) -> impl Future<Output = Result<String>> + Send {
        self.elevate(options)
    }

    /// Leave configuration (command) mode.
    fn exit_command_mode(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send {
        self.de_elevate(command)
    }

    /// Whether configuration (command) mode is active, judged by `check`.
    fn is_command_mode_active_with(&self, check: &str) -> bool {
        self.is_elevated_with(check)
    }

    /// Whether configuration (command) mode is active.
    fn is_command_mode_active(&self) -> bool {
        self.is_elevated()
    }
}
