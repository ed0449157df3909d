use crate::error::DispatchError;
use crate::ids::EventId;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, trace};

use super::core::{Event, EventState, EventType, Phase};
use super::path::Node;

/// Upper bound on event cycles per dispatch (request + auto-triggered
/// successors). Guards against hooks that keep scheduling events.
pub const MAX_EVENT_CYCLES: usize = 16;

/// Receives events for one (node, event type) pair.
///
/// `C` is the per-dispatch context threaded through every listener. A
/// listener may read or set the event's result, schedule an auto-trigger
/// successor or discard the event. Returning an error aborts the dispatch.
pub trait Listener<C>: Send + Sync {
    fn on_event(&self, event: &mut Event, cx: &mut C) -> anyhow::Result<()>;
}

impl<C, F> Listener<C> for F
where
    F: Fn(&mut Event, &mut C) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &mut Event, cx: &mut C) -> anyhow::Result<()> {
        self(event, cx)
    }
}

/// Hooks the owner of a dispatch plugs into the cycle loop.
pub trait Terminal<C> {
    /// Runs between the DOWN and UP phases of an event that was not
    /// discarded. Errors are re-raised to the caller of [`EventBus::dispatch`].
    fn reached(&mut self, event: &mut Event, cx: &mut C) -> Result<(), DispatchError>;

    /// Runs once per cycle after the event completed or was discarded.
    fn finished(&mut self, _event: &Event, _cx: &mut C) {}
}

/// Summary of one finished event cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: EventId,
    pub event_type: EventType,
    pub state: EventState,
    pub target: Option<Node>,
    pub cause: Option<EventId>,
}

impl EventRecord {
    fn of(event: &Event) -> Self {
        Self {
            id: event.id(),
            event_type: event.event_type(),
            state: event.state(),
            target: event.target().cloned(),
            cause: event.last_dispatched_event().map(Event::id),
        }
    }
}

/// Ordered record of every cycle a dispatch ran.
pub type DispatchTrace = Vec<EventRecord>;

type ListenerVec<C> = SmallVec<[Arc<dyn Listener<C>>; 2]>;

/// Listener registry plus the propagation algorithm.
///
/// Built once at initialization and then only read.
pub struct EventBus<C> {
    listeners: HashMap<(Node, EventType), ListenerVec<C>>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }
}

impl<C> EventBus<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `event_type` on `node`. Listeners for the same
    /// pair run in registration order.
    pub fn add_listener(&mut self, node: Node, event_type: EventType, listener: Arc<dyn Listener<C>>) {
        self.listeners
            .entry((node, event_type))
            .or_default()
            .push(listener);
    }

    /// Number of listeners registered for a pair.
    #[must_use]
    pub fn listener_count(&self, node: &Node, event_type: EventType) -> usize {
        self.listeners
            .get(&(node.clone(), event_type))
            .map_or(0, SmallVec::len)
    }

    /// Run one phase of `event` along its path.
    ///
    /// DOWN walks the path outermost-first and re-reads its length after
    /// every node, so a listener may extend the path ahead of itself. UP
    /// walks a snapshot in reverse. A discard stops the walk immediately.
    pub fn propagate(&self, event: &mut Event, phase: Phase, cx: &mut C) -> Result<(), DispatchError> {
        if event.is_discarded() {
            return Ok(());
        }
        event.enter_phase(phase);
        let event_type = event.event_type();

        match phase {
            Phase::Down => {
                let mut index = 0;
                while let Some(node) = event.path().get(index).cloned() {
                    if self.notify(&node, event_type, event, cx)?.is_break() {
                        break;
                    }
                    index += 1;
                }
            }
            Phase::Up => {
                let nodes: SmallVec<[Node; 4]> = event.path().iter().rev().cloned().collect();
                for node in &nodes {
                    if self.notify(node, event_type, event, cx)?.is_break() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn notify(
        &self,
        node: &Node,
        event_type: EventType,
        event: &mut Event,
        cx: &mut C,
    ) -> Result<ControlFlow<()>, DispatchError> {
        let Some(listeners) = self.listeners.get(&(node.clone(), event_type)) else {
            return Ok(ControlFlow::Continue(()));
        };

        for listener in listeners {
            listener
                .on_event(event, cx)
                .map_err(|source| DispatchError::Listener {
                    node: node.to_string(),
                    source,
                })?;
            if event.is_discarded() {
                debug!(
                    event_id = %event.id(),
                    event_type = %event_type,
                    node = %node,
                    phase = ?event.phase(),
                    "Event discarded, propagation stopped"
                );
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Run full cycles for `event` and every auto-triggered successor.
    ///
    /// Each cycle is DOWN, [`Terminal::reached`], UP, complete. When a cycle
    /// ends with an auto-trigger scheduled, the successor starts a fresh
    /// cycle owning the finished event as its cause.
    pub fn dispatch(
        &self,
        event: Event,
        cx: &mut C,
        terminal: &mut impl Terminal<C>,
    ) -> Result<DispatchTrace, DispatchError> {
        let mut trace = DispatchTrace::new();
        let mut next = Some(event);

        while let Some(mut event) = next.take() {
            if trace.len() >= MAX_EVENT_CYCLES {
                return Err(DispatchError::CycleLimit(MAX_EVENT_CYCLES));
            }
            trace!(
                event_id = %event.id(),
                event_type = %event.event_type(),
                path = %event.path(),
                "Event cycle start"
            );

            self.propagate(&mut event, Phase::Down, cx)?;
            if !event.is_discarded() {
                terminal.reached(&mut event, cx)?;
            }
            self.propagate(&mut event, Phase::Up, cx)?;
            event.complete();

            terminal.finished(&event, cx);
            trace.push(EventRecord::of(&event));

            if let Some(mut successor) = event.take_auto_trigger() {
                debug!(
                    event_id = %event.id(),
                    successor_id = %successor.id(),
                    successor_type = %successor.event_type(),
                    "Dispatching auto-triggered event"
                );
                successor.chain_from(event);
                next = Some(successor);
            }
        }
        Ok(trace)
    }
}
