//! # Router Module
//!
//! Resolution of a request to one action.
//!
//! ## Overview
//!
//! A [`Router`] owns a configuration scope (protocol, hostname, path
//! prefix) and an ordered list of actions. Resolution is two-phase:
//!
//! 1. **Compilation**: at build time every action pattern such as
//!    `/user/{user_id}/profile/edit/` is compiled by the [`matcher`] into an
//!    anchored regex with one named group per placeholder.
//!
//! 2. **Matching**: for each request, actions are tried in declaration
//!    order. An action is skipped when it is invalid, when it restricts
//!    methods and the request's method is not allowed, or when it has no
//!    pattern. The first pattern that matches wins and its captures become
//!    the request's URI parameters.
//!
//! ## Placeholders
//!
//! | Token | Matches |
//! |---|---|
//! | `{name}` | one or more characters other than `/` |
//! | `<d:name>` | ASCII digits |
//! | `<w:name>` | word characters |
//! | `<a:name>` | ASCII letters |
//! | `<s:name>` or `<name>` | one path segment |
//!
//! A placeholder with a configured default may match nothing; the default
//! is then substituted.
//!
//! ## Reverse routing
//!
//! Reverse generation walks the pattern left to right and substitutes
//! positional parameters in order. Too few parameters is an error; surplus
//! parameters are ignored.
//!
//! ```rust
//! use actiondispatch::router::CompiledPattern;
//! use std::collections::HashMap;
//!
//! let pattern = CompiledPattern::compile("/user/<d:user_id>/profile/edit/", &HashMap::new()).unwrap();
//! let params = pattern.match_path("/user/42/profile/edit/").unwrap();
//! assert_eq!(params.get_str("user_id"), Some("42"));
//! assert!(pattern.match_path("/user/ada/profile/edit/").is_none());
//! assert_eq!(pattern.reverse(&["7"]).unwrap(), "/user/7/profile/edit/");
//! ```

mod core;
pub mod matcher;

pub use core::Router;
pub use matcher::{match_action, CompiledPattern, Placeholder, PlaceholderKind};
