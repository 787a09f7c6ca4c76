//! Output accumulator with tail-only prompt search.
//!
//! Shell prompts only ever show up at the end of the output, so matching
//! is restricted to the last `search_depth` bytes. Long listings or large
//! checksum runs do not make prompt detection slower.

use regex::bytes::Regex;

/// Accumulates channel output and searches its tail for prompt patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: Vec<u8>,

    /// How many bytes from the end are searched for patterns.
    search_depth: usize,

    /// Strip ANSI escape sequences on the way in.
    strip_ansi: bool,
}

impl PatternBuffer {
    /// Create a new buffer searching the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
            strip_ansi: false,
        }
    }

    /// Enable or disable ANSI escape stripping for data appended from now on.
    pub fn set_strip_ansi(&mut self, enabled: bool) {
        self.strip_ansi = enabled;
    }

    /// Append data read from the channel.
    pub fn extend(&mut self, data: &[u8]) {
        if self.strip_ansi {
            let cleaned = strip_ansi_escapes::strip(data);
            self.buffer.extend_from_slice(&cleaned);
        } else {
            self.buffer.extend_from_slice(data);
        }
    }

    /// Find `pattern` in the tail of the buffer.
    ///
    /// Returns the end offset of the match relative to the whole buffer.
    pub fn find_in_tail(&self, pattern: &Regex) -> Option<usize> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern
            .find(&self.buffer[start..])
            .map(|m| start + m.end())
    }

    /// Remove and return everything up to `end`, keeping the remainder.
    pub fn take_until(&mut self, end: usize) -> Vec<u8> {
        let end = end.min(self.buffer.len());
        let rest = self.buffer.split_off(end);
        std::mem::replace(&mut self.buffer, rest)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}
