//! PTY channel over an SSH session.

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use russh::ChannelMsg;
use russh::client::Msg;

use super::buffer::PatternBuffer;
use super::patterns::literal_prompt_pattern;
use super::session::{SessionChannel, normalize_output};
use crate::error::{ChannelError, Result};
use crate::platform::linux::PromptTerminators;
use crate::transport::SshTransport;

/// How long `read_channel` waits for more data before returning.
const READ_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Default timeout for reads.
    pub timeout: Duration,

    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// Multiplier for every fixed delay in the session workflow.
    pub delay_factor: f64,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            search_depth: 1000,
            delay_factor: 1.0,
        }
    }
}

/// Interactive shell channel backed by a russh PTY session.
pub struct PtyChannel {
    config: PtyConfig,
    channel: russh::Channel<Msg>,
    transport: Option<SshTransport>,
    buffer: PatternBuffer,
    terminators: PromptTerminators,

    /// Pattern ending every command's output; `None` until a prompt is known.
    base_prompt: Option<Regex>,
}

impl PtyChannel {
    /// Open a PTY shell on `transport`.
    pub async fn open(transport: SshTransport, config: PtyConfig) -> Result<Self> {
        let channel = transport.open_channel().await?;
        debug!("PTY channel opened to {}", transport.config().socket_addr());

        Ok(Self {
            buffer: PatternBuffer::new(config.search_depth),
            config,
            channel,
            transport: Some(transport),
            terminators: PromptTerminators::global().clone(),
            base_prompt: None,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &PtyConfig {
        &self.config
    }

    fn handle_message(&mut self, msg: ChannelMsg) -> Result<()> {
        match msg {
            ChannelMsg::Data { data } => {
                trace!("read {} bytes", data.len());
                self.buffer.extend(&data);
            }
            ChannelMsg::ExtendedData { data, .. } => self.buffer.extend(&data),
            ChannelMsg::Eof | ChannelMsg::Close => return Err(ChannelError::Closed.into()),
            _ => trace!("ignoring non-data channel message"),
        }
        Ok(())
    }

    fn prompt_pattern(&self) -> Result<Regex> {
        match &self.base_prompt {
            Some(pattern) => Ok(pattern.clone()),
            None => Ok(self
                .terminators
                .any_prompt_pattern()
                .map_err(ChannelError::from)?),
        }
    }
}

impl SessionChannel for PtyChannel {
    async fn write_channel(&mut self, data: &str) -> Result<()> {
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn read_channel(&mut self) -> Result<String> {
        loop {
            match tokio::time::timeout(READ_POLL_INTERVAL, self.channel.wait()).await {
                Err(_) => break,
                Ok(Some(msg)) => self.handle_message(msg)?,
                Ok(None) => return Err(ChannelError::Closed.into()),
            }
        }
        let data = self.buffer.take();
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some(end) = self.buffer.find_in_tail(pattern) {
                let data = self.buffer.take_until(end);
                return Ok(String::from_utf8_lossy(&data).into_owned());
            }

            match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Err(_) => return Err(ChannelError::PatternTimeout(timeout).into()),
                Ok(Some(msg)) => self.handle_message(msg)?,
                Ok(None) => return Err(ChannelError::Closed.into()),
            }
        }
    }

    async fn send_command(&mut self, command: &str, read_timeout: Duration) -> Result<String> {
        let pattern = self.prompt_pattern()?;

        // Output left over from an earlier exchange would end this read early.
        let stale = self.read_channel().await?;
        if !stale.is_empty() {
            trace!("discarding {} stale bytes", stale.len());
        }

        self.write_channel(&format!("{command}\n")).await?;
        let raw = self.read_until_pattern(&pattern, read_timeout).await?;

        Ok(normalize_output(&raw, command))
    }

    fn set_base_prompt(&mut self, prompt: &str) -> Result<()> {
        self.base_prompt = Some(literal_prompt_pattern(prompt).map_err(ChannelError::from)?);
        Ok(())
    }

    fn set_terminators(&mut self, terminators: &PromptTerminators) {
        self.terminators = terminators.clone();
    }

    fn set_ansi_stripping(&mut self, enabled: bool) {
        self.buffer.set_strip_ansi(enabled);
    }

    fn delay_factor(&self) -> f64 {
        self.config.delay_factor
    }

    fn read_timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn close(&mut self) -> Result<()> {
        // The remote side usually closed the channel already after `exit`.
        if let Err(e) = self.channel.close().await {
            debug!("channel close: {}", e);
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }
}
