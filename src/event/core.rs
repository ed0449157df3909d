use crate::ids::EventId;
use crate::server::Request;
use serde_json::Value;
use std::fmt;
use tracing::warn;

use super::path::{Node, PropagationPath};
use super::response::{RedirectCode, ResponseEvent};

/// Propagation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Outermost node to innermost
    Down,
    /// Innermost node back out
    Up,
}

/// Per-event state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventState {
    Created,
    DispatchingDown,
    DispatchingUp,
    Complete,
    /// Absorbing: reachable from either dispatching state (or before
    /// dispatch), never left.
    Discarded,
}

/// Type tag selecting the listener registry an event is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Request,
    Response200,
    Response302,
    Response303,
    Response404,
    Response500,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::Request => "request",
            EventType::Response200 => "response_200",
            EventType::Response302 => "response_302",
            EventType::Response303 => "response_303",
            EventType::Response404 => "response_404",
            EventType::Response500 => "response_500",
        };
        f.write_str(s)
    }
}

/// Event payload.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// An inbound HTTP request
    Request(Box<Request>),
    /// A response decision
    Response(ResponseEvent),
}

/// The propagation unit.
///
/// Created fresh for every logical occurrence and never reused across
/// requests. The event that caused this one (the "last dispatched event") is
/// owned by its successor, so a response listener can read the originating
/// request event's result.
#[derive(Debug)]
pub struct Event {
    id: EventId,
    kind: EventKind,
    phase: Phase,
    state: EventState,
    target: Option<Node>,
    path: PropagationPath,
    result: Option<Value>,
    auto_trigger: Option<Box<Event>>,
    cause: Option<Box<Event>>,
}

impl Event {
    fn with_kind(kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            kind,
            phase: Phase::Down,
            state: EventState::Created,
            target: None,
            path: PropagationPath::new(),
            result: None,
            auto_trigger: None,
            cause: None,
        }
    }

    /// A request event carrying `request`.
    #[must_use]
    pub fn request(request: Request) -> Self {
        Self::with_kind(EventKind::Request(Box::new(request)))
    }

    /// A response event.
    #[must_use]
    pub fn response(response: ResponseEvent) -> Self {
        Self::with_kind(EventKind::Response(response))
    }

    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        match &self.kind {
            EventKind::Request(_) => EventType::Request,
            EventKind::Response(r) => r.event_type(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> EventState {
        self.state
    }

    #[must_use]
    pub fn is_discarded(&self) -> bool {
        self.state == EventState::Discarded
    }

    /// The node this event is ultimately aimed at, e.g. a matched action.
    #[must_use]
    pub fn target(&self) -> Option<&Node> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, node: Node) {
        self.target = Some(node);
    }

    #[must_use]
    pub fn path(&self) -> &PropagationPath {
        &self.path
    }

    /// Mutable path. Routers extend it while the DOWN phase is running.
    pub fn path_mut(&mut self) -> &mut PropagationPath {
        &mut self.path
    }

    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, result: Value) {
        self.result = Some(result);
    }

    /// The inbound request, for request events.
    #[must_use]
    pub fn request_data(&self) -> Option<&Request> {
        match &self.kind {
            EventKind::Request(req) => Some(&**req),
            EventKind::Response(_) => None,
        }
    }

    pub(crate) fn request_data_mut(&mut self) -> Option<&mut Request> {
        match &mut self.kind {
            EventKind::Request(req) => Some(&mut **req),
            EventKind::Response(_) => None,
        }
    }

    /// The request that started this chain of events.
    #[must_use]
    pub fn originating_request(&self) -> Option<&Request> {
        let mut current = Some(self);
        while let Some(event) = current {
            if let Some(req) = event.request_data() {
                return Some(req);
            }
            current = event.last_dispatched_event();
        }
        None
    }

    #[must_use]
    pub fn response_data(&self) -> Option<&ResponseEvent> {
        match &self.kind {
            EventKind::Response(r) => Some(r),
            EventKind::Request(_) => None,
        }
    }

    /// Stop propagation. Remaining listeners of the current phase are
    /// skipped and the event never enters (or leaves) its UP phase.
    pub fn discard(&mut self) {
        self.state = EventState::Discarded;
    }

    /// Schedule `successor` to be dispatched right after this event's
    /// propagation completes. Replaces any previously scheduled successor.
    pub fn set_auto_trigger(&mut self, successor: Event) {
        self.auto_trigger = Some(Box::new(successor));
    }

    #[must_use]
    pub fn auto_trigger(&self) -> Option<&Event> {
        self.auto_trigger.as_deref()
    }

    pub(crate) fn take_auto_trigger(&mut self) -> Option<Event> {
        self.auto_trigger.take().map(|e| *e)
    }

    /// Schedule a 302 or 303 redirect to `uri`.
    pub fn redirect(&mut self, uri: impl Into<String>, code: RedirectCode) {
        self.set_auto_trigger(Event::response(ResponseEvent::redirect(uri, code)));
    }

    /// The event whose completion triggered this one.
    #[must_use]
    pub fn last_dispatched_event(&self) -> Option<&Event> {
        self.cause.as_deref()
    }

    /// Attach the finished predecessor. A successor without its own route
    /// inherits the predecessor's path and target.
    pub(crate) fn chain_from(&mut self, predecessor: Event) {
        if self.path.is_empty() {
            self.path = predecessor.path.clone();
            if self.target.is_none() {
                self.target = predecessor.target.clone();
            }
        }
        self.cause = Some(Box::new(predecessor));
    }

    pub(crate) fn enter_phase(&mut self, phase: Phase) {
        let next = match phase {
            Phase::Down => EventState::DispatchingDown,
            Phase::Up => EventState::DispatchingUp,
        };
        if self.transition(next) {
            self.phase = phase;
        }
    }

    pub(crate) fn complete(&mut self) {
        self.transition(EventState::Complete);
    }

    fn transition(&mut self, next: EventState) -> bool {
        use EventState::*;
        let allowed = matches!(
            (self.state, next),
            (Created, DispatchingDown)
                | (DispatchingDown, DispatchingUp)
                | (DispatchingDown, Complete)
                | (DispatchingUp, Complete)
        );
        if allowed {
            self.state = next;
        } else if self.state != Discarded {
            warn!(
                event_id = %self.id,
                from = ?self.state,
                to = ?next,
                "Ignored invalid event state transition"
            );
        }
        allowed
    }
}
