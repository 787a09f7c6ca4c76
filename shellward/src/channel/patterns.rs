//! Prompt pattern construction and prompt extraction.

use regex::bytes::Regex;

/// Build a pattern matching output that ends in either prompt terminator.
///
/// Only the very end of the data is considered; earlier lines that happen
/// to end in `$` or `#` do not count as a prompt.
pub fn terminator_pattern(primary: &str, alternate: &str) -> Result<Regex, regex::Error> {
    let pattern = if primary == alternate || alternate.is_empty() {
        format!(r"{}[ \t]*$", regex::escape(primary))
    } else {
        format!(
            r"(?:{}|{})[ \t]*$",
            regex::escape(primary),
            regex::escape(alternate)
        )
    };
    Regex::new(&pattern)
}

/// Build a pattern matching a literal prompt at the end of the output.
pub fn literal_prompt_pattern(prompt: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"{}[ \t]*$", regex::escape(prompt)))
}

/// Anchor a user-supplied pattern to the end of the output unless it
/// already is.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!(r"{}\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// Return the last non-empty line of `output`, trimmed.
pub fn last_line(output: &str) -> &str {
    let trimmed = output.trim_end();
    let start = memchr::memrchr2(b'\n', b'\r', trimmed.as_bytes())
        .map(|pos| pos + 1)
        .unwrap_or(0);
    trimmed[start..].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminator_pattern_matches_end_only() {
        let pattern = terminator_pattern("$", "#").unwrap();
        assert!(pattern.is_match(b"\r\nuser@host:~$ "));
        assert!(pattern.is_match(b"\r\nroot@host:~#"));
        assert!(!pattern.is_match(b"user@host:~$ \r\nPassword: "));
    }

    #[test]
    fn test_terminator_pattern_same_chars() {
        let pattern = terminator_pattern("#", "#").unwrap();
        assert!(pattern.is_match(b"root@host:~# "));
        assert!(!pattern.is_match(b"user@host:~$ "));
    }

    #[test]
    fn test_literal_prompt_pattern_escapes() {
        let pattern = literal_prompt_pattern("user@host:~$").unwrap();
        assert!(pattern.is_match(b"ls\r\nfile\r\nuser@host:~$ "));
        assert!(!pattern.is_match(b"user@host:~# "));
    }

    #[test]
    fn test_compile_prompt_pattern() {
        let pattern = compile_prompt_pattern(r"bash-\d\.\d#").unwrap();
        assert!(pattern.is_match(b"bash-5.1# "));

        let pattern = compile_prompt_pattern(r"host>$").unwrap();
        assert!(pattern.is_match(b"host>"));
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("\r\nuser@host:~$ "), "user@host:~$");
        assert_eq!(last_line("a\nb\r\n  root@host:/# \r\n"), "root@host:/#");
        assert_eq!(last_line("prompt$"), "prompt$");
        assert_eq!(last_line(""), "");
    }
}
