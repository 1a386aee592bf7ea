//! Shell-style glob patterns
//!
//! Patterns are compiled into an anchored `regex::Regex`. Supported syntax:
//!
//! | Syntax | Matches |
//! |--------|---------|
//! | `*` | any run of characters except a path separator |
//! | `?` | one character except a path separator |
//! | `[abc]`, `[a-z]` | one character from the class |
//! | `[!abc]`, `[^abc]` | one character not in the class |
//! | `\x` | the literal character `x` |

use regex::Regex;
use crate::error::RunError;

#[cfg(windows)]
const SEPARATORS: &str = r"/\\";
#[cfg(not(windows))]
const SEPARATORS: &str = "/";

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a glob pattern.
    pub fn new(pattern: &str) -> Result<Self, RunError> {
        let translated = translate(pattern)?;
        let regex = Regex::new(&translated).map_err(|e| {
            RunError::invalid_argument(format!("bad glob pattern {:?}: {}", pattern, e))
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Report whether `name` matches the whole pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Compile `pattern` and match it against `name` in one step.
pub fn glob_match(pattern: &str, name: &str) -> Result<bool, RunError> {
    Ok(Pattern::new(pattern)?.matches(name))
}

fn translate(pattern: &str) -> Result<String, RunError> {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                out.push_str(&format!("[^{}]*", SEPARATORS));
            }
            '?' => {
                out.push_str(&format!("[^{}]", SEPARATORS));
            }
            '[' => {
                let class = parse_class(&mut chars, pattern)?;
                out.push_str(&class);
            }
            '\\' => {
                let escaped = chars.next().ok_or_else(|| {
                    RunError::invalid_argument(format!("bad glob pattern {:?}: trailing backslash", pattern))
                })?;
                out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
            }
            _ => {
                out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            }
        }
    }

    out.push('$');
    Ok(out)
}

/// Parse a character class after its opening `[` and return the regex class.
fn parse_class(chars: &mut std::str::Chars<'_>, pattern: &str) -> Result<String, RunError> {
    let unterminated = || {
        RunError::invalid_argument(format!("bad glob pattern {:?}: unterminated character class", pattern))
    };

    let mut items: Vec<(char, char)> = Vec::new();
    let mut negate = false;
    let mut first = true;

    loop {
        let c = chars.next().ok_or_else(unterminated)?;
        match c {
            '!' | '^' if first && !negate => {
                negate = true;
                continue;
            }
            ']' => {
                if items.is_empty() {
                    return Err(RunError::invalid_argument(format!(
                        "bad glob pattern {:?}: empty character class", pattern
                    )));
                }
                break;
            }
            _ => {}
        }
        first = false;

        let lo = if c == '\\' { chars.next().ok_or_else(unterminated)? } else { c };

        // Look ahead for a range; a trailing '-' before ']' is literal.
        let mut ahead = chars.clone();
        if ahead.next() == Some('-') {
            match ahead.next() {
                Some(']') | None => {
                    items.push((lo, lo));
                }
                Some(hi) => {
                    let hi = if hi == '\\' { ahead.next().ok_or_else(unterminated)? } else { hi };
                    if hi < lo {
                        return Err(RunError::invalid_argument(format!(
                            "bad glob pattern {:?}: invalid range {}-{}", pattern, lo, hi
                        )));
                    }
                    items.push((lo, hi));
                    *chars = ahead;
                }
            }
        } else {
            items.push((lo, lo));
        }
    }

    let mut class = String::from("[");
    if negate {
        class.push('^');
        class.push_str(SEPARATORS);
    }
    for (lo, hi) in items {
        class.push_str(&regex::escape(lo.encode_utf8(&mut [0; 4])));
        if hi != lo {
            class.push('-');
            class.push_str(&regex::escape(hi.encode_utf8(&mut [0; 4])));
        }
    }
    class.push(']');
    Ok(class)
}
