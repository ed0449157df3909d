//! # Event Module
//!
//! The propagation unit of the engine. Instead of calling controllers
//! directly, every logical occurrence (an inbound request, each response
//! decision) is an [`Event`] that travels along a [`PropagationPath`]:
//! DOWN from the outermost node to the innermost, then UP in reverse.
//!
//! ## Lifecycle
//!
//! ```text
//! Created -> DispatchingDown -> DispatchingUp -> Complete
//!                 |                  |
//!                 +---> Discarded <--+
//! ```
//!
//! `Discarded` is absorbing: once a listener calls [`Event::discard`], no
//! further listener on the path sees the event in the current phase and the
//! UP phase is skipped. If the event carries an auto-trigger successor, the
//! [`EventBus`] dispatches it as a fresh cycle as soon as the current one
//! unwinds, with the finished event reachable through
//! [`Event::last_dispatched_event`].
//!
//! ## Listeners
//!
//! Listeners are registered per node and event type at build time and are
//! invoked in registration order. Registration is append-only; the bus is
//! read-only while dispatching.

mod bus;
mod core;
mod path;
mod response;

pub use bus::{DispatchTrace, EventBus, EventRecord, Listener, Terminal, MAX_EVENT_CYCLES};
pub use core::{Event, EventKind, EventState, EventType, Phase};
pub use path::{Node, PropagationPath};
pub use response::{RedirectCode, ResponseEvent};
