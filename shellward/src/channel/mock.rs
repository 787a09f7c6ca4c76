//! Scripted in-memory channel for unit tests.

use std::collections::VecDeque;
use std::time::Duration;

use regex::bytes::Regex;

use super::session::SessionChannel;
use crate::error::{ChannelError, Result};
use crate::platform::PromptTerminators;

/// A channel that answers each write with the next scripted reply.
///
/// Replies are queued in order; every `write_channel` call consumes one
/// (an empty reply means the remote printed nothing). A reply arrives as one
/// or more separate messages, like PTY data frames. `read_until_pattern`
/// consumes them one at a time and leaves later messages queued, while
/// `read_channel` drains everything available. `send_command` consumes from
/// a separate queue of command outputs.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    replies: VecDeque<Vec<String>>,
    command_outputs: VecDeque<String>,
    inbox: VecDeque<String>,
    buffer: String,
    fail_write_of: Option<String>,

    pub writes: Vec<String>,
    pub commands: Vec<(String, Duration)>,
    pub sleeps: Vec<Duration>,
    pub base_prompt: Option<String>,
    pub ansi_stripping: bool,
    pub closed: bool,
    pub terminators: Option<PromptTerminators>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output produced by the next write.
    pub fn reply(mut self, output: &str) -> Self {
        self.replies.push_back(vec![output.to_string()]);
        self
    }

    /// Queue a reply delivered as several separate messages.
    pub fn reply_in_parts(mut self, parts: &[&str]) -> Self {
        self.replies
            .push_back(parts.iter().map(|part| part.to_string()).collect());
        self
    }

    /// Put `output` in front of every queued reply.
    pub fn reply_first(mut self, output: &str) -> Self {
        self.replies.push_front(vec![output.to_string()]);
        self
    }

    /// Queue the output of the next `send_command`.
    pub fn command_output(mut self, output: &str) -> Self {
        self.command_outputs.push_back(output.to_string());
        self
    }

    /// Make writing exactly `data` fail as if the channel had closed.
    pub fn fail_write_of(mut self, data: &str) -> Self {
        self.fail_write_of = Some(data.to_string());
        self
    }

    /// Writes other than the neutral prompt-refresh keystroke.
    pub fn command_writes(&self) -> Vec<&str> {
        self.writes
            .iter()
            .map(String::as_str)
            .filter(|w| *w != "\n")
            .collect()
    }
}

impl SessionChannel for ScriptedChannel {
    async fn write_channel(&mut self, data: &str) -> Result<()> {
        if self.fail_write_of.as_deref() == Some(data) {
            return Err(ChannelError::Closed.into());
        }
        self.writes.push(data.to_string());
        if let Some(reply) = self.replies.pop_front() {
            self.inbox.extend(reply.into_iter().filter(|part| !part.is_empty()));
        }
        Ok(())
    }

    async fn read_channel(&mut self) -> Result<String> {
        let mut output = std::mem::take(&mut self.buffer);
        output.extend(self.inbox.drain(..));
        Ok(output)
    }

    async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        loop {
            if pattern.is_match(self.buffer.as_bytes()) {
                return Ok(std::mem::take(&mut self.buffer));
            }
            match self.inbox.pop_front() {
                Some(message) => self.buffer.push_str(&message),
                None => return Err(ChannelError::PatternTimeout(timeout).into()),
            }
        }
    }

    async fn send_command(&mut self, command: &str, read_timeout: Duration) -> Result<String> {
        self.commands.push((command.to_string(), read_timeout));
        Ok(self.command_outputs.pop_front().unwrap_or_default())
    }

    fn set_base_prompt(&mut self, prompt: &str) -> Result<()> {
        self.base_prompt = Some(prompt.to_string());
        Ok(())
    }

    fn set_terminators(&mut self, terminators: &PromptTerminators) {
        self.terminators = Some(terminators.clone());
    }

    fn set_ansi_stripping(&mut self, enabled: bool) {
        self.ansi_stripping = enabled;
    }

    fn delay_factor(&self) -> f64 {
        1.0
    }

    fn read_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
