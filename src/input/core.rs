use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Request parameter channel.
///
/// The declaration order is also the default merge precedence: later
/// channels override earlier ones, so URI-extracted parameters win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Get,
    Post,
    Cookie,
    Uri,
}

impl Channel {
    /// Default merge order for the controller-input view.
    pub const DEFAULT_ORDER: [Channel; 4] =
        [Channel::Get, Channel::Post, Channel::Cookie, Channel::Uri];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Get => write!(f, "GET"),
            Channel::Post => write!(f, "POST"),
            Channel::Cookie => write!(f, "COOKIE"),
            Channel::Uri => write!(f, "URI"),
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Channel::Get),
            "POST" => Ok(Channel::Post),
            "COOKIE" => Ok(Channel::Cookie),
            "URI" => Ok(Channel::Uri),
            other => Err(format!("unknown input channel `{other}`")),
        }
    }
}

/// Ordered, nested key/value container with dot-path access.
///
/// Backed by a `serde_json` map so insertion order is kept for serialization
/// and values can be scalars, nested mappings or sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Input {
    items: Map<String, Value>,
}

impl Input {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing map.
    #[must_use]
    pub fn from_map(items: Map<String, Value>) -> Self {
        Self { items }
    }

    /// Build from a JSON value. Non-object values yield an empty container.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(items) => Self { items },
            _ => Self::default(),
        }
    }

    /// Build from flat form-style pairs such as query strings or cookies.
    ///
    /// Keys use bracket notation for nesting (`user[name]=ada`), and a
    /// trailing `[]` appends to a sequence (`tags[]=a&tags[]=b`).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = Self::new();
        for (key, value) in pairs {
            input.insert_form_pair(key.as_ref(), value.into());
        }
        input
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve a dot-delimited path.
    ///
    /// Returns `None` the instant a segment is absent or the current value is
    /// neither a mapping nor an indexable sequence. Never panics.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.items.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Resolve a path, falling back to `default` when it is missing.
    #[must_use]
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// Resolve a path to a string slice.
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Assign `value` at a dot-delimited path, creating intermediate mappings.
    ///
    /// An intermediate value that is not a mapping is replaced by one.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.items;
        for segment in parents {
            let slot = current
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert((*last).to_string(), value.into());
    }

    /// Remove the value at `path`, returning it.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;
        let mut current = &mut self.items;
        for segment in parents {
            current = match current.get_mut(*segment) {
                Some(Value::Object(map)) => map,
                _ => return None,
            };
        }
        current.remove(*last)
    }

    /// Deep, right-biased merge of `other` into `self`.
    pub fn merge(&mut self, other: &Input) {
        merge_maps(&mut self.items, &other.items);
    }

    /// Consuming variant of [`Input::merge`], convenient for chaining.
    #[must_use]
    pub fn merged(mut self, other: &Input) -> Self {
        self.merge(other);
        self
    }

    /// Nested view of the container.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.items.clone())
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.items
    }

    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.items
    }

    /// Top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    fn insert_form_pair(&mut self, key: &str, value: String) {
        let (path, append) = bracket_key_to_path(key);
        if path.is_empty() {
            return;
        }
        if !append {
            self.set(&path, Value::String(value));
            return;
        }
        match self.get(&path) {
            Some(Value::Array(existing)) => {
                let mut items = existing.clone();
                items.push(Value::String(value));
                self.set(&path, Value::Array(items));
            }
            _ => self.set(&path, Value::Array(vec![Value::String(value)])),
        }
    }
}

impl From<Map<String, Value>> for Input {
    fn from(items: Map<String, Value>) -> Self {
        Self::from_map(items)
    }
}

impl From<Input> for Value {
    fn from(input: Input) -> Self {
        Value::Object(input.items)
    }
}

fn merge_maps(target: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_maps(existing, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// `user[name][first]` -> (`user.name.first`, false); `tags[]` -> (`tags`, true)
fn bracket_key_to_path(key: &str) -> (String, bool) {
    let Some(open) = key.find('[') else {
        return (key.to_string(), false);
    };

    let mut path = key[..open].to_string();
    let mut append = false;
    for part in key[open..].split('[').skip(1) {
        let segment = part.strip_suffix(']').unwrap_or(part);
        if segment.is_empty() {
            append = true;
            break;
        }
        path.push('.');
        path.push_str(segment);
    }
    (path, append)
}

#[cfg(test)]
pub(super) fn bracket_path(key: &str) -> (String, bool) {
    bracket_key_to_path(key)
}
