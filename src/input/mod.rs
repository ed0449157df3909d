//! # Input Module
//!
//! Nested key/value containers for request parameters. One [`Input`] exists per
//! request channel (GET, POST, COOKIE and URI-extracted parameters); the
//! channels are merged into a single controller-input view when an action is
//! matched.
//!
//! ## Paths
//!
//! Values are addressed with dot-delimited paths. `get("a.b.c")` walks nested
//! mappings one segment at a time and yields `None` as soon as a segment is
//! missing or the current value cannot be descended into. Numeric segments
//! index into sequences.
//!
//! ```rust
//! use actiondispatch::input::Input;
//! use serde_json::json;
//!
//! let mut input = Input::new();
//! input.set("user.profile.name", json!("ada"));
//! assert_eq!(input.get("user.profile.name"), Some(&json!("ada")));
//! assert_eq!(input.get("user.missing"), None);
//! ```
//!
//! ## Merging
//!
//! [`Input::merge`] is a deep, right-biased union: nested mappings are merged
//! recursively, and any other collision is won by the incoming container.

mod core;
#[cfg(test)]
mod tests;

pub use core::{Channel, Input};
