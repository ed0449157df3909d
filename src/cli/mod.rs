//! # CLI Module
//!
//! Command-line access to a route manifest. Every command builds a
//! dispatcher with echo controllers (see [`crate::echo`]), so routing,
//! validation targets and reverse routing can be exercised without
//! application code.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! ```bash
//! actiondispatch routes --manifest routes.yaml
//! ```
//!
//! ### `reverse`
//!
//! ```bash
//! actiondispatch reverse --manifest routes.yaml --action profile_edit 42
//! ```
//!
//! ### `dispatch`
//!
//! ```bash
//! actiondispatch dispatch --manifest routes.yaml --uri http://localhost/user/42/profile/edit/
//! actiondispatch dispatch --manifest routes.yaml --method POST --uri /user/42 \
//!     -H 'Content-Type: application/x-www-form-urlencoded' --body 'name=ada'
//! actiondispatch dispatch --manifest routes.yaml --request-file request.http
//! ```
//!
//! Logging goes to stderr and is configured with the `ACTIONDISPATCH_LOG_*`
//! variables (see [`crate::logging`]).

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{descriptor, run, run_cli, Cli, Commands};
