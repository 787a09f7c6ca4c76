//! The capability set a shell session needs from its control channel.

use std::future::Future;
use std::time::Duration;

use regex::bytes::Regex;

use crate::error::Result;
use crate::platform::PromptTerminators;

/// A live, half-duplex interactive channel.
///
/// Implementations own the underlying transport exclusively. Every method
/// takes `&mut self`, so a channel can only ever have one write or read in
/// flight.
pub trait SessionChannel: Send {
    /// Write raw text to the channel.
    fn write_channel(&mut self, data: &str) -> impl Future<Output = Result<()>> + Send;

    /// Drain whatever output is currently available. May return an empty string.
    fn read_channel(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Read until `pattern` matches the tail of the accumulated output.
    ///
    /// Fails with [`ChannelError::PatternTimeout`](crate::error::ChannelError::PatternTimeout)
    /// when nothing matches within `timeout`.
    fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Run one command through the generic execution loop.
    ///
    /// Writes the command, waits for the base prompt and returns the output
    /// without the command echo and trailing prompt.
    fn send_command(
        &mut self,
        command: &str,
        read_timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Record the prompt that terminates command output.
    fn set_base_prompt(&mut self, prompt: &str) -> Result<()>;

    /// Terminators that end command output until a base prompt is recorded.
    fn set_terminators(&mut self, terminators: &PromptTerminators);

    /// Toggle interpretation (stripping) of terminal escape sequences.
    fn set_ansi_stripping(&mut self, enabled: bool);

    /// Multiplier applied to every fixed delay.
    fn delay_factor(&self) -> f64;

    /// Default bound for reads.
    fn read_timeout(&self) -> Duration;

    /// Tear down the channel and its transport.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Pause for `duration`.
    fn sleep(&mut self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    /// Pause for `base` scaled by [`delay_factor`](Self::delay_factor).
    fn scaled_delay(&mut self, base: Duration) -> impl Future<Output = ()> + Send {
        let duration = base.mul_f64(self.delay_factor().max(0.0));
        self.sleep(duration)
    }
}

/// Strip the command echo and the trailing prompt line from raw output.
pub fn normalize_output(raw: &str, command: &str) -> String {
    let unified = raw.replace("\r\n", "\n");
    let output = unified.trim_start_matches(['\r', '\n']);
    let output = output
        .strip_prefix(command)
        .unwrap_or(output)
        .trim_start_matches(['\r', '\n']);

    match output.rfind('\n') {
        Some(pos) => output[..pos].to_string(),
        None => String::new(),
    }
}
