//! Pattern compilation, matching and reverse generation.
//!
//! A pattern is literal path text plus placeholder tokens:
//!
//! - `{name}` - untyped, matches one non-empty path segment
//! - `<k:name>` - typed, where `k` selects the character class
//!
//! Literal text is escaped, so `.` or `+` in a pattern match themselves.

use crate::action::Action;
use crate::error::{ConfigError, ReverseError};
use crate::input::Input;
use crate::server::Request;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Character class a placeholder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `{name}`: anything but `/`
    Any,
    /// `<d:name>`: ASCII digits
    Digits,
    /// `<w:name>`: word characters
    Word,
    /// `<a:name>`: ASCII letters
    Alpha,
    /// `<s:name>`: one path segment
    Segment,
}

impl PlaceholderKind {
    fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "d" => Some(PlaceholderKind::Digits),
            "w" => Some(PlaceholderKind::Word),
            "a" => Some(PlaceholderKind::Alpha),
            "s" => Some(PlaceholderKind::Segment),
            _ => None,
        }
    }

    fn class(self) -> &'static str {
        match self {
            PlaceholderKind::Any | PlaceholderKind::Segment => "[^/]",
            PlaceholderKind::Digits => "[0-9]",
            PlaceholderKind::Word => r"\w",
            PlaceholderKind::Alpha => "[A-Za-z]",
        }
    }
}

/// One placeholder of a compiled pattern, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: Arc<str>,
    pub kind: PlaceholderKind,
    /// Substituted when the capture is empty
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
enum Token {
    Literal(String),
    Placeholder(usize),
}

/// A URI pattern compiled to an anchored regular expression with one named
/// group per placeholder.
///
/// Compiled once when the route table is built and shared read-only.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: Arc<str>,
    regex: Regex,
    tokens: Vec<Token>,
    placeholders: Vec<Placeholder>,
}

impl CompiledPattern {
    /// Compile `pattern`. `defaults` maps placeholder names to the value
    /// used when their capture is empty; such placeholders may match nothing.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidPattern`] for unbalanced delimiters, empty or
    /// duplicate placeholder names and patterns the regex engine rejects;
    /// [`ConfigError::UnknownPlaceholderType`] for an unknown type letter.
    pub fn compile(pattern: &str, defaults: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut tokens = Vec::new();
        let mut placeholders: Vec<Placeholder> = Vec::new();
        let mut regex_src = String::with_capacity(pattern.len() + 16);
        regex_src.push('^');

        let mut literal = String::new();
        let mut rest = pattern;
        while let Some(pos) = rest.find(['{', '<', '}', '>']) {
            let (head, tail) = rest.split_at(pos);
            literal.push_str(head);

            let open = tail.as_bytes()[0];
            let close = match open {
                b'{' => '}',
                b'<' => '>',
                _ => return Err(invalid("closing delimiter without opening one")),
            };
            let Some(end) = tail.find(close) else {
                return Err(invalid("unterminated placeholder"));
            };
            let body = &tail[1..end];
            if body.contains(['{', '<']) {
                return Err(invalid("nested placeholder"));
            }

            let (kind, name) = if open == b'{' {
                (PlaceholderKind::Any, body)
            } else {
                match body.split_once(':') {
                    Some((letter, name)) => {
                        let kind = PlaceholderKind::from_letter(letter).ok_or_else(|| {
                            ConfigError::UnknownPlaceholderType {
                                pattern: pattern.to_string(),
                                kind: letter.to_string(),
                            }
                        })?;
                        (kind, name)
                    }
                    None => (PlaceholderKind::Segment, body),
                }
            };
            if !is_identifier(name) {
                return Err(invalid(&format!("invalid placeholder name `{name}`")));
            }
            if placeholders.iter().any(|p| &*p.name == name) {
                return Err(invalid(&format!("duplicate placeholder `{name}`")));
            }

            if !literal.is_empty() {
                let encoded = encode_literal(&std::mem::take(&mut literal));
                regex_src.push_str(&regex::escape(&encoded));
                tokens.push(Token::Literal(encoded));
            }

            let default = defaults.get(name).cloned();
            let quantifier = if default.is_some() { '*' } else { '+' };
            regex_src.push_str(&format!("(?P<{name}>{}{quantifier})", kind.class()));
            tokens.push(Token::Placeholder(placeholders.len()));
            placeholders.push(Placeholder {
                name: Arc::from(name),
                kind,
                default,
            });

            rest = &tail[end + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            let encoded = encode_literal(&literal);
            regex_src.push_str(&regex::escape(&encoded));
            tokens.push(Token::Literal(encoded));
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            source: Arc::from(pattern),
            regex,
            tokens,
            placeholders,
        })
    }

    /// The human-authored pattern.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    /// Evaluate against a request path. On a match, every placeholder is
    /// returned as a percent-decoded string, with defaults substituted for
    /// empty captures.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Input> {
        let caps = self.regex.captures(path)?;
        let mut params = Input::new();
        for placeholder in &self.placeholders {
            let raw = caps.name(&placeholder.name).map_or("", |m| m.as_str());
            let value = match (&placeholder.default, raw.is_empty()) {
                (Some(default), true) => default.clone(),
                _ => urlencoding::decode(raw)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| raw.to_string()),
            };
            params.set(&placeholder.name, Value::String(value));
        }
        Some(params)
    }

    /// Substitute positional `params` into the placeholders, left to right.
    ///
    /// # Errors
    ///
    /// [`ReverseError::MissingParams`] when fewer parameters than
    /// placeholders are given. Surplus parameters are ignored.
    pub fn reverse<S: AsRef<str>>(&self, params: &[S]) -> Result<String, ReverseError> {
        let expected = self.placeholders.len();
        if params.len() < expected {
            return Err(ReverseError::MissingParams {
                pattern: self.source.to_string(),
                expected,
                given: params.len(),
            });
        }
        if params.len() > expected {
            debug!(
                pattern = %self.source,
                expected,
                given = params.len(),
                "Ignoring surplus reverse-routing parameters"
            );
        }

        let mut uri = String::with_capacity(self.source.len());
        for token in &self.tokens {
            match token {
                Token::Literal(text) => uri.push_str(text),
                Token::Placeholder(index) => {
                    uri.push_str(&urlencoding::encode(params[*index].as_ref()));
                }
            }
        }
        Ok(uri)
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Percent-encode literal pattern text the way request paths arrive, so
/// `/café` matches `/caf%C3%A9`. Existing `%` escapes pass through.
fn encode_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_graphic() && !matches!(c, '"' | '#' | '<' | '>' | '?' | '`' | '{' | '}') {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `path` starts with `prefix` on a segment boundary, so `/api`
/// covers `/api` and `/api/x` but not `/apiary`.
#[must_use]
pub fn has_path_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Prepend a router prefix to an action pattern that does not already
/// start with it as a whole segment. A prefix of `/` leaves the pattern
/// unchanged.
#[must_use]
pub fn scoped_pattern(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() || has_path_prefix(pattern, prefix) {
        return pattern.to_string();
    }
    if pattern.starts_with('/') {
        format!("{prefix}{pattern}")
    } else {
        format!("{prefix}/{pattern}")
    }
}

/// Evaluate `action` against `request`.
///
/// No match when the action is invalid, when it restricts methods and the
/// request's method is not allowed, or when it has no pattern. Otherwise
/// the pattern decides and its captures are returned as URI parameters.
#[must_use]
pub fn match_action(action: &Action, request: &Request) -> Option<Input> {
    if !action.is_valid() || !action.allows_method(request.method()) {
        return None;
    }
    action.pattern()?.match_path(request.path())
}
