//! # Action Module
//!
//! An action binds a URI pattern and a set of HTTP methods to one
//! controller method. Actions are described with [`ActionDef`] (by hand or
//! from a manifest), compiled into [`Action`]s when the dispatcher is built
//! and collected in the [`ActionTable`], the static name-keyed registry used
//! for dispatch and reverse routing.
//!
//! ## Lifecycle hooks
//!
//! [`ActionHooks`] is where application code reacts to the execution state
//! machine:
//!
//! | Hook | Fires when |
//! |---|---|
//! | `on_data_validation_fail` | the validator rejected the input (event discarded) |
//! | `on_pre_exec` | right before the controller method, inside the transaction |
//! | `on_post_exec` | after a successful call and commit |
//! | `on_graceful_fail` | the method returned [`Outcome::Failure`](crate::controller::Outcome) |
//! | `on_hard_fail` | the method raised; the error is re-raised afterwards |
//! | `on_success` | UP phase of a succeeded request |
//! | `on_response_200` | a 200 response event reached the action |
//!
//! ```rust
//! use actiondispatch::action::{ActionHooks, HookContext};
//! use actiondispatch::event::Event;
//!
//! struct BackToList;
//!
//! impl ActionHooks for BackToList {
//!     fn on_success(&self, cx: &HookContext<'_>, event: &mut Event) -> anyhow::Result<()> {
//!         cx.redirect_to_action::<&str>(event, "user_list", &[])?;
//!         Ok(())
//!     }
//! }
//! ```

mod core;
mod hooks;
mod table;

pub use core::{Action, ActionDef, BoundValidator, TransactionSpec, ValidatorRef};
pub use hooks::{ActionHooks, DefaultHooks, HookContext};
pub use table::ActionTable;
