use crate::error::{ConfigError, ReverseError};
use std::collections::HashMap;
use std::sync::Arc;

use super::core::Action;

/// Static registry of every action, keyed by name and kept in declaration
/// order. Read-only once the dispatcher is built.
#[derive(Debug, Clone, Default)]
pub struct ActionTable {
    actions: Vec<Arc<Action>>,
    index: HashMap<Arc<str>, usize>,
}

impl ActionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateAction`] when the name is taken.
    pub fn insert(&mut self, action: Arc<Action>) -> Result<(), ConfigError> {
        let name: Arc<str> = Arc::from(action.name());
        if self.index.contains_key(&name) {
            return Err(ConfigError::DuplicateAction(name.to_string()));
        }
        self.index.insert(name, self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Action>> {
        self.index.get(name).and_then(|&i| self.actions.get(i))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.actions.iter()
    }

    /// Path of `action` with `params` substituted.
    ///
    /// # Errors
    ///
    /// [`ReverseError::UnknownAction`] or [`ReverseError::MissingParams`].
    pub fn reverse_path<S: AsRef<str>>(&self, action: &str, params: &[S]) -> Result<String, ReverseError> {
        self.lookup(action)?.reverse_path(params)
    }

    /// Absolute URI of `action` on its router with `params` substituted.
    ///
    /// # Errors
    ///
    /// [`ReverseError::UnknownAction`] or [`ReverseError::MissingParams`].
    pub fn reverse_uri<S: AsRef<str>>(&self, action: &str, params: &[S]) -> Result<String, ReverseError> {
        self.lookup(action)?.reverse_uri(params)
    }

    fn lookup(&self, action: &str) -> Result<&Arc<Action>, ReverseError> {
        self.get(action)
            .ok_or_else(|| ReverseError::UnknownAction(action.to_string()))
    }
}
