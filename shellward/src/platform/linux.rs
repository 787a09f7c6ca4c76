//! Linux shell platform settings.
//!
//! Standard Linux/Unix shells show `$` for regular users and `#` for root.
//! On this target privilege *is* configuration access: there is no separate
//! configuration sub-mode, so "command mode" and "elevated" are the same.

use std::env;

use once_cell::sync::Lazy;
use regex::bytes::{Regex, RegexBuilder};

use crate::channel::patterns::{compile_prompt_pattern, terminator_pattern};

/// The identity that can never drop privilege.
pub const SUPERUSER: &str = "root";

/// Default command used to become root.
pub const DEFAULT_ELEVATE_COMMAND: &str = "sudo -s";

/// Default command used to leave a root shell.
pub const DEFAULT_EXIT_COMMAND: &str = "exit";

/// Default credential prompt pattern, matches `Password:` and `[sudo] password for`.
pub const DEFAULT_CREDENTIAL_PROMPT: &str = "ssword";

static TERMINATORS: Lazy<PromptTerminators> = Lazy::new(PromptTerminators::from_env);

/// Prompt terminator characters for each privilege level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTerminators {
    /// Regular user prompt terminator (default `$`).
    pub primary: String,

    /// Alternate terminator accepted during prompt discovery (default `#`).
    pub alternate: String,

    /// Terminator identifying an elevated prompt (default `#`).
    pub elevated: String,
}

impl PromptTerminators {
    /// Environment variable overriding [`primary`](Self::primary).
    pub const ENV_PRIMARY: &'static str = "SHELLWARD_PROMPT_PRI";
    /// Environment variable overriding [`alternate`](Self::alternate).
    pub const ENV_ALTERNATE: &'static str = "SHELLWARD_PROMPT_ALT";
    /// Environment variable overriding [`elevated`](Self::elevated).
    pub const ENV_ELEVATED: &'static str = "SHELLWARD_PROMPT_ROOT";

    /// Process-wide terminators, read from the environment on first use.
    pub fn global() -> &'static PromptTerminators {
        &TERMINATORS
    }

    /// Read terminators from the environment, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str, fallback: String| {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or(fallback)
        };

        Self {
            primary: read(Self::ENV_PRIMARY, defaults.primary),
            alternate: read(Self::ENV_ALTERNATE, defaults.alternate),
            elevated: read(Self::ENV_ELEVATED, defaults.elevated),
        }
    }

    /// Pattern matching output that ends in any known prompt.
    pub fn any_prompt_pattern(&self) -> Result<Regex, regex::Error> {
        terminator_pattern(&self.primary, &self.alternate)
    }
}

impl Default for PromptTerminators {
    fn default() -> Self {
        Self {
            primary: "$".to_string(),
            alternate: "#".to_string(),
            elevated: "#".to_string(),
        }
    }
}

/// Parameters for base prompt discovery.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    /// Primary terminator the prompt may end in.
    pub primary: String,

    /// Alternate terminator the prompt may end in.
    pub alternate: String,

    /// Multiplier on top of the channel's own delay factor.
    pub delay_factor: f64,

    /// Explicit pattern to read up to instead of the terminators.
    pub pattern: Option<Regex>,
}

impl PromptOptions {
    /// Read up to `pattern` instead of the terminator pattern.
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Read up to a prompt given as pattern text, anchored to the end of output.
    pub fn with_prompt_pattern(self, pattern: &str) -> Result<Self, regex::Error> {
        Ok(self.with_pattern(compile_prompt_pattern(pattern)?))
    }

    /// Scale the discovery delay.
    pub fn with_delay_factor(mut self, delay_factor: f64) -> Self {
        self.delay_factor = delay_factor;
        self
    }
}

impl Default for PromptOptions {
    fn default() -> Self {
        let terminators = PromptTerminators::global();
        Self {
            primary: terminators.primary.clone(),
            alternate: terminators.alternate.clone(),
            delay_factor: 1.0,
            pattern: None,
        }
    }
}

/// Credential prompt matcher compiled once.
#[derive(Debug, Clone)]
pub struct CredentialPrompt {
    regex: Regex,
    case_insensitive: bool,
}

impl CredentialPrompt {
    /// Compile `pattern` with the given case sensitivity.
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            regex,
            case_insensitive,
        })
    }

    /// Whether `output` contains the credential prompt.
    pub fn is_match(&self, output: &str) -> bool {
        self.regex.is_match(output.as_bytes())
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether matching ignores case.
    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl Default for CredentialPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIAL_PROMPT, true).expect("default credential prompt is valid")
    }
}

/// How to acquire superuser privilege.
#[derive(Debug, Clone)]
pub struct ElevateOptions {
    /// Command that starts a root shell.
    pub command: String,

    /// Prompt that asks for the elevation credential.
    pub credential_prompt: CredentialPrompt,

    /// Pattern to wait for after the credential is written.
    pub enable_pattern: Option<Regex>,
}

impl ElevateOptions {
    /// Options using `command` and the default credential prompt.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Override the credential prompt.
    pub fn with_credential_prompt(mut self, prompt: CredentialPrompt) -> Self {
        self.credential_prompt = prompt;
        self
    }

    /// Wait for `pattern` after sending the credential.
    pub fn with_enable_pattern(mut self, pattern: Regex) -> Self {
        self.enable_pattern = Some(pattern);
        self
    }
}

impl Default for ElevateOptions {
    fn default() -> Self {
        Self {
            command: DEFAULT_ELEVATE_COMMAND.to_string(),
            credential_prompt: CredentialPrompt::default(),
            enable_pattern: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_terminators() {
        let terminators = PromptTerminators::from_lookup(|_| None);
        assert_eq!(terminators, PromptTerminators::default());
        assert_eq!(terminators.primary, "$");
        assert_eq!(terminators.alternate, "#");
        assert_eq!(terminators.elevated, "#");
    }

    #[test]
    fn test_terminators_from_environment() {
        let terminators = PromptTerminators::from_lookup(|key| match key {
            PromptTerminators::ENV_PRIMARY => Some(">".to_string()),
            PromptTerminators::ENV_ELEVATED => Some("%".to_string()),
            PromptTerminators::ENV_ALTERNATE => Some(String::new()),
            _ => None,
        });
        assert_eq!(terminators.primary, ">");
        assert_eq!(terminators.alternate, "#");
        assert_eq!(terminators.elevated, "%");
    }

    #[test]
    fn test_any_prompt_pattern() {
        let pattern = PromptTerminators::default().any_prompt_pattern().unwrap();
        assert!(pattern.is_match(b"user@host:~$ "));
        assert!(pattern.is_match(b"root@host:~# "));
        assert!(!pattern.is_match(b"[sudo] password for user: "));
    }

    #[test]
    fn test_prompt_options_with_prompt_pattern() {
        let options = PromptOptions::default()
            .with_prompt_pattern(r"\(venv\) \w+>")
            .unwrap();
        let pattern = options.pattern.unwrap();
        assert!(pattern.is_match(b"\r\n(venv) deploy> "));
        assert!(!pattern.is_match(b"(venv) deploy> ls\r\nfile"));

        assert!(PromptOptions::default().with_prompt_pattern("(").is_err());
    }

    #[test]
    fn test_credential_prompt_case() {
        let prompt = CredentialPrompt::default();
        assert!(prompt.case_insensitive());
        assert!(prompt.is_match("[sudo] password for user: "));
        assert!(prompt.is_match("PASSWORD:"));

        let strict = CredentialPrompt::new("ssword", false).unwrap();
        assert!(!strict.is_match("PASSWORD:"));
        assert!(strict.is_match("Password:"));
    }

    #[test]
    fn test_elevate_options_default() {
        let options = ElevateOptions::default();
        assert_eq!(options.command, "sudo -s");
        assert_eq!(options.credential_prompt.as_str(), "ssword");
        assert!(options.enable_pattern.is_none());

        let options = ElevateOptions::new("su -");
        assert_eq!(options.command, "su -");
    }
}
