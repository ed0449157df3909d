//! Input validation consumed by actions.
//!
//! A validator inspects the controller-input view before the controller
//! runs. When it rejects the input the request event is discarded and the
//! action's `on_data_validation_fail` hook receives the issues; no
//! transaction is opened and the controller is never invoked.

use crate::input::Input;
use crate::server::HttpMethod;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Validator contract: given a controller-input view, report what is wrong.
pub trait Validator: Send + Sync {
    fn validate(&self, input: &Input) -> Vec<ValidationIssue>;

    /// `true` when the input is acceptable.
    fn run(&self, input: &Input) -> bool {
        self.validate(input).is_empty()
    }
}

impl<F> Validator for F
where
    F: Fn(&Input) -> bool + Send + Sync,
{
    fn validate(&self, input: &Input) -> Vec<ValidationIssue> {
        if self(input) {
            Vec::new()
        } else {
            vec![ValidationIssue::new("input", "rejected", "validator returned false")]
        }
    }
}

/// Request methods a validator binding applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MethodTarget {
    /// Every method
    #[default]
    All,
    /// Only the listed methods
    Methods(Vec<HttpMethod>),
}

impl MethodTarget {
    #[must_use]
    pub fn applies(&self, method: HttpMethod) -> bool {
        match self {
            MethodTarget::All => true,
            MethodTarget::Methods(methods) => methods.contains(&method),
        }
    }

    /// Parse method tokens; `ALL` (or an empty list) targets every method.
    ///
    /// # Errors
    ///
    /// The first token that is neither `ALL` nor a supported method.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, String> {
        let mut methods = Vec::with_capacity(tokens.len());
        for token in tokens {
            let token = token.as_ref();
            if token.eq_ignore_ascii_case("ALL") {
                return Ok(MethodTarget::All);
            }
            let method = token.parse::<HttpMethod>().map_err(|_| token.to_string())?;
            methods.push(method);
        }
        if methods.is_empty() {
            Ok(MethodTarget::All)
        } else {
            Ok(MethodTarget::Methods(methods))
        }
    }
}

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+$").expect("valid email regex")
});

/// A declarative field rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// The path must be present and not an empty string or null
    Required { field: String },
    /// ASCII digits only
    Digits { field: String },
    /// A plausible e-mail address
    Email { field: String },
    /// At most `max` characters
    MaxLen { field: String, max: usize },
    /// At least `min` characters
    MinLen { field: String, min: usize },
    /// One of the listed strings
    OneOf { field: String, values: Vec<String> },
}

impl Rule {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Rule::Required { field }
            | Rule::Digits { field }
            | Rule::Email { field }
            | Rule::MaxLen { field, .. }
            | Rule::MinLen { field, .. }
            | Rule::OneOf { field, .. } => field,
        }
    }

    fn check(&self, input: &Input) -> Option<ValidationIssue> {
        let field = self.field();
        let value = input.get(field);

        if let Rule::Required { .. } = self {
            return match value {
                None | Some(Value::Null) => Some(ValidationIssue::new(field, "required", "missing")),
                Some(Value::String(s)) if s.is_empty() => {
                    Some(ValidationIssue::new(field, "required", "empty"))
                }
                _ => None,
            };
        }

        // Absent optional fields pass; pair with `Required` to enforce presence.
        let text = match value {
            None | Some(Value::Null) => return None,
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        match self {
            Rule::Digits { .. } if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) => {
                Some(ValidationIssue::new(field, "digits", "expected digits only"))
            }
            Rule::Email { .. } if !EMAIL.is_match(&text) => {
                Some(ValidationIssue::new(field, "email", "not an e-mail address"))
            }
            Rule::MaxLen { max, .. } if text.chars().count() > *max => Some(ValidationIssue::new(
                field,
                "max_len",
                format!("longer than {max} characters"),
            )),
            Rule::MinLen { min, .. } if text.chars().count() < *min => Some(ValidationIssue::new(
                field,
                "min_len",
                format!("shorter than {min} characters"),
            )),
            Rule::OneOf { values, .. } if !values.iter().any(|v| v == &text) => Some(
                ValidationIssue::new(field, "one_of", format!("expected one of {values:?}")),
            ),
            _ => None,
        }
    }
}

/// A validator built from a list of [`Rule`]s; every rule is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleValidator {
    rules: Vec<Rule>,
}

impl RuleValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn required(self, field: &str) -> Self {
        self.rule(Rule::Required { field: field.into() })
    }

    #[must_use]
    pub fn digits(self, field: &str) -> Self {
        self.rule(Rule::Digits { field: field.into() })
    }

    #[must_use]
    pub fn email(self, field: &str) -> Self {
        self.rule(Rule::Email { field: field.into() })
    }

    #[must_use]
    pub fn max_len(self, field: &str, max: usize) -> Self {
        self.rule(Rule::MaxLen { field: field.into(), max })
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl Validator for RuleValidator {
    fn validate(&self, input: &Input) -> Vec<ValidationIssue> {
        self.rules.iter().filter_map(|rule| rule.check(input)).collect()
    }
}
