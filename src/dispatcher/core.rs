use crate::action::{Action, ActionDef, ActionHooks, ActionTable, BoundValidator};
use crate::config::{AppConfig, RouterConfig};
use crate::controller::{Controller, Services};
use crate::error::{ConfigError, DispatchError, ReverseError};
use crate::event::{
    DispatchTrace, Event, EventBus, EventRecord, EventType, Listener, Node, ResponseEvent, Terminal,
};
use crate::manifest::Manifest;
use crate::router::Router;
use crate::server::{HttpResponse, Request};
use crate::validator::Validator;
use http::StatusCode;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

use super::context::{DispatchContext, ExecState, Registry};
use super::exec;
use super::listeners::{ActionListener, RouterListener};

/// What a dispatch produced.
#[derive(Debug)]
pub struct DispatchReport {
    /// The rendered response, `None` when no response event completed
    pub response: Option<HttpResponse>,
    /// Every event cycle that ran, in order
    pub trace: DispatchTrace,
    /// Execution states entered, starting with `Idle`
    pub exec_states: Vec<ExecState>,
}

impl DispatchReport {
    /// Status of the rendered response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.response.as_ref().map(|r| r.status)
    }

    /// Event types in dispatch order.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        self.trace.iter().map(|r| r.event_type).collect()
    }

    /// Last execution state.
    #[must_use]
    pub fn final_state(&self) -> ExecState {
        self.exec_states.last().copied().unwrap_or(ExecState::Idle)
    }

    /// The request event's record.
    #[must_use]
    pub fn request_record(&self) -> Option<&EventRecord> {
        self.trace.iter().find(|r| r.event_type == EventType::Request)
    }
}

/// Runs the matched action between the phases and renders response events.
#[derive(Default)]
struct Outbound {
    response: Option<HttpResponse>,
}

impl Terminal<DispatchContext> for Outbound {
    fn reached(&mut self, event: &mut Event, cx: &mut DispatchContext) -> Result<(), DispatchError> {
        if event.event_type() != EventType::Request {
            return Ok(());
        }
        let Some(Node::Action(name)) = event.target().cloned() else {
            return Ok(());
        };
        let action = cx
            .registry()
            .actions()
            .get(&name)
            .cloned()
            .ok_or_else(|| DispatchError::Execution {
                action: name.to_string(),
                source: anyhow::anyhow!("target action is not registered"),
            })?;
        exec::execute(&action, event, cx)
    }

    fn finished(&mut self, event: &Event, cx: &mut DispatchContext) {
        if event.is_discarded() {
            return;
        }
        if let Some(response) = event.response_data() {
            let mut out = HttpResponse::default();
            response.output(&mut out);
            debug!(
                event_id = %event.id(),
                status = out.status.as_u16(),
                location = ?response.location(),
                "Response rendered"
            );
            self.response = Some(out);
            cx.enter(ExecState::Responded);
        }
    }
}

/// The dispatch engine: routers, actions and controllers wired onto one
/// event bus.
///
/// Built once with [`DispatcherBuilder`] and then shared read-only; every
/// call to [`Dispatcher::dispatch`] gets its own context.
pub struct Dispatcher {
    registry: Arc<Registry>,
    routers: Vec<Arc<Router>>,
    bus: EventBus<DispatchContext>,
}

impl Dispatcher {
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    #[must_use]
    pub fn routers(&self) -> &[Arc<Router>] {
        &self.routers
    }

    #[must_use]
    pub fn actions(&self) -> &ActionTable {
        self.registry.actions()
    }

    #[must_use]
    pub fn app(&self) -> &AppConfig {
        self.registry.app()
    }

    /// Route `request` and run every event cycle it causes.
    ///
    /// The first router whose scope accepts the request becomes the root of
    /// the propagation path. When none does, the request event is discarded
    /// before dispatch and a 404 is auto-triggered.
    ///
    /// # Errors
    ///
    /// A hard failure of the controller, a data-access failure, a failing
    /// listener or a runaway auto-trigger chain.
    pub fn dispatch(&self, request: Request) -> Result<DispatchReport, DispatchError> {
        let span = info_span!(
            "dispatch",
            request_id = %request.id(),
            method = %request.method(),
            path = %request.path()
        );
        let _enter = span.enter();

        let mut event = Event::request(request);
        let scope = event
            .request_data()
            .and_then(|request| self.routers.iter().find(|router| router.match_request(request)));
        match scope {
            Some(router) => event.path_mut().push(router.node().clone()),
            None => {
                warn!(routers = self.routers.len(), "No router accepts request");
                event.set_auto_trigger(Event::response(ResponseEvent::NotFound));
                event.discard();
            }
        }
        self.dispatch_event(event)
    }

    /// Dispatch an already built event, e.g. a response event fired
    /// outside a request.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn dispatch_event(&self, event: Event) -> Result<DispatchReport, DispatchError> {
        let start = Instant::now();
        let mut cx = DispatchContext::new(Arc::clone(&self.registry));
        let mut outbound = Outbound::default();

        let trace = self.bus.dispatch(event, &mut cx, &mut outbound)?;
        let report = DispatchReport {
            response: outbound.response,
            trace,
            exec_states: cx.into_states(),
        };

        info!(
            status = ?report.status().map(|s| s.as_u16()),
            events = report.trace.len(),
            final_state = %report.final_state(),
            duration_us = start.elapsed().as_micros(),
            "Request dispatched"
        );
        Ok(report)
    }

    /// Dispatch and always produce a response.
    ///
    /// An error escaping the dispatch is logged and answered by dispatching
    /// a 500 response event. A dispatch that rendered nothing yields an
    /// empty 200.
    pub fn respond(&self, request: Request) -> HttpResponse {
        match self.dispatch(request) {
            Ok(report) => report.response.unwrap_or_default(),
            Err(err) => {
                error!(error = %err, "Dispatch failed, responding 500");
                let event = Event::response(ResponseEvent::ServerError {
                    message: Some(err.to_string()),
                });
                self.dispatch_event(event)
                    .ok()
                    .and_then(|report| report.response)
                    .unwrap_or_else(|| HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }

    /// Absolute URI of `action` with positional `params`.
    ///
    /// # Errors
    ///
    /// [`ReverseError`] when the action is unknown or `params` is short.
    pub fn reverse_uri<S: AsRef<str>>(&self, action: &str, params: &[S]) -> Result<String, ReverseError> {
        self.registry.actions().reverse_uri(action, params)
    }

    /// Path of `action` with positional `params`.
    ///
    /// # Errors
    ///
    /// [`ReverseError`] when the action is unknown or `params` is short.
    pub fn reverse_path<S: AsRef<str>>(&self, action: &str, params: &[S]) -> Result<String, ReverseError> {
        self.registry.actions().reverse_path(action, params)
    }

    /// Print every router and its actions to stdout.
    pub fn dump_routes(&self) {
        for router in &self.routers {
            router.dump_routes();
        }
    }
}

/// Collects routers, controllers, validators, services and hooks, then
/// resolves every action against them.
pub struct DispatcherBuilder {
    app: AppConfig,
    routers: Vec<(RouterConfig, Vec<ActionDef>)>,
    controllers: HashMap<String, Arc<Controller>>,
    validators: HashMap<String, Arc<dyn Validator>>,
    services: Services,
    hooks: HashMap<String, Arc<dyn ActionHooks>>,
    listeners: Vec<(Node, EventType, Arc<dyn Listener<DispatchContext>>)>,
    strict: bool,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: AppConfig::default(),
            routers: Vec::new(),
            controllers: HashMap::new(),
            validators: HashMap::new(),
            services: Services::new(),
            hooks: HashMap::new(),
            listeners: Vec::new(),
            strict: true,
        }
    }

    /// Application context routers inherit their scope from.
    #[must_use]
    pub fn app(mut self, app: AppConfig) -> Self {
        self.app = app;
        self
    }

    /// Add a router with its actions in match order. Routers are tried in
    /// the order they are added.
    #[must_use]
    pub fn router(mut self, config: RouterConfig, actions: Vec<ActionDef>) -> Self {
        self.routers.push((config, actions));
        self
    }

    /// Add the application context and every router of a manifest.
    #[must_use]
    pub fn manifest(mut self, manifest: Manifest) -> Self {
        let (app, routers) = manifest.into_parts();
        self.app = app;
        self.routers.extend(routers);
        self
    }

    #[must_use]
    pub fn controller(mut self, controller: Controller) -> Self {
        self.controllers
            .insert(controller.name().to_string(), Arc::new(controller));
        self
    }

    #[must_use]
    pub fn validator(mut self, name: &str, validator: impl Validator + 'static) -> Self {
        self.validators.insert(name.to_string(), Arc::new(validator));
        self
    }

    #[must_use]
    pub fn service<T: Any + Send + Sync>(mut self, name: &str, service: T) -> Self {
        self.services.register(name, service);
        self
    }

    /// Lifecycle hooks for the action called `action`.
    #[must_use]
    pub fn hooks(mut self, action: &str, hooks: impl ActionHooks + 'static) -> Self {
        self.hooks.insert(action.to_string(), Arc::new(hooks));
        self
    }

    /// An extra listener. Runs after the engine's own listener on the same
    /// node and event type.
    #[must_use]
    pub fn listener(
        mut self,
        node: Node,
        event_type: EventType,
        listener: impl Listener<DispatchContext> + 'static,
    ) -> Self {
        self.listeners.push((node, event_type, Arc::new(listener)));
        self
    }

    /// Mark actions that fail to resolve as invalid instead of failing the
    /// build. Invalid actions never match.
    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Resolve every action and wire the event bus.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`]. In lenient mode only duplicate names and
    /// pattern errors still fail here; other resolution failures mark the
    /// action invalid.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        let mut table = ActionTable::new();
        let mut routers = Vec::with_capacity(self.routers.len());
        let mut router_names = HashSet::new();
        let mut bus = EventBus::new();

        for (config, defs) in &self.routers {
            if !router_names.insert(config.name.clone()) {
                return Err(ConfigError::DuplicateRouter(config.name.clone()));
            }
            let mut router = Router::from_config(config, &self.app);

            for def in defs {
                let action = match self.resolve_action(def, &router) {
                    Ok(action) => action,
                    Err(err @ (ConfigError::InvalidPattern { .. } | ConfigError::UnknownPlaceholderType { .. })) => {
                        return Err(err)
                    }
                    Err(err) if !self.strict => {
                        warn!(router = %router.name(), action = %def.name, error = %err, "Action marked invalid");
                        Action::invalid(def, router.name())
                    }
                    Err(err) => return Err(err),
                };
                let action = Arc::new(action);
                table.insert(Arc::clone(&action))?;

                let listener: Arc<dyn Listener<DispatchContext>> = Arc::new(ActionListener::new(Arc::clone(&action)));
                bus.add_listener(action.node().clone(), EventType::Request, Arc::clone(&listener));
                bus.add_listener(action.node().clone(), EventType::Response200, listener);
                router.add_action(action);
            }

            let router = Arc::new(router);
            bus.add_listener(
                router.node().clone(),
                EventType::Request,
                Arc::new(RouterListener::new(Arc::clone(&router))),
            );
            routers.push(router);
        }

        for (node, event_type, listener) in self.listeners {
            bus.add_listener(node, event_type, listener);
        }

        info!(
            routers = routers.len(),
            actions = table.len(),
            controllers = self.controllers.len(),
            "Dispatcher built"
        );

        Ok(Dispatcher {
            registry: Arc::new(Registry {
                actions: table,
                controllers: self.controllers,
                app: self.app,
            }),
            routers,
            bus,
        })
    }

    fn resolve_action(&self, def: &ActionDef, router: &Router) -> Result<Action, ConfigError> {
        let mut action = Action::compile(def, router.name(), router.path_prefix(), &router.origin())?;

        let controller = self
            .controllers
            .get(&def.controller)
            .ok_or_else(|| ConfigError::UnknownController {
                action: def.name.clone(),
                controller: def.controller.clone(),
            })?;
        let method = controller
            .get_method(&def.method)
            .ok_or_else(|| ConfigError::UnknownControllerMethod {
                action: def.name.clone(),
                controller: def.controller.clone(),
                method: def.method.clone(),
            })?;

        if def.transaction.is_some() && controller.data_access().is_none() {
            return Err(ConfigError::MissingDataAccess {
                action: def.name.clone(),
                controller: def.controller.clone(),
            });
        }

        let service_names = if def.services.is_empty() {
            method.services()
        } else {
            def.services.as_slice()
        };
        let services = self
            .services
            .resolve(service_names)
            .map_err(|service| ConfigError::UnknownService {
                controller: def.controller.clone(),
                method: def.method.clone(),
                service,
            })?;
        action.set_services(services);

        if let Some(reference) = &def.validator {
            let validator = self
                .validators
                .get(&reference.name)
                .ok_or_else(|| ConfigError::UnknownValidator {
                    action: def.name.clone(),
                    validator: reference.name.clone(),
                })?;
            action.set_validator(BoundValidator {
                name: Arc::from(reference.name.as_str()),
                validator: Arc::clone(validator),
                target: reference.target.clone(),
            });
        }

        if let Some(hooks) = self.hooks.get(&def.name) {
            action.set_hooks(Arc::clone(hooks));
        }
        Ok(action)
    }
}
