use crate::action::Action;
use crate::config::{AppConfig, RouterConfig};
use crate::event::{Event, Node, ResponseEvent};
use crate::input::Input;
use crate::server::Request;
use std::sync::Arc;
use std::time::{Duration, Instant};
use super::matcher;
use tracing::{debug, info, warn};

/// Matching slower than this is reported.
const SLOW_MATCH: Duration = Duration::from_millis(1);

/// Entry point for one configuration scope: a protocol, an optional
/// hostname, an optional path prefix and the actions registered under them
/// in declaration order.
#[derive(Debug, Clone)]
pub struct Router {
    name: Arc<str>,
    node: Node,
    protocol: String,
    hostname: Option<String>,
    path_prefix: Option<String>,
    actions: Vec<Arc<Action>>,
    initialized: bool,
}

impl Router {
    /// An unscoped router: every hostname and path belongs to it.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            node: Node::router(name),
            protocol: "http".to_string(),
            hostname: None,
            path_prefix: None,
            actions: Vec::new(),
            initialized: false,
        }
    }

    /// Build and initialize a router from its configuration.
    #[must_use]
    pub fn from_config(config: &RouterConfig, app: &AppConfig) -> Self {
        let mut router = Self::new(&config.name);
        router.init(config, app);
        router
    }

    /// Resolve protocol, hostname and prefix (router settings first, then
    /// the application context) and run the init hook. The hook runs once;
    /// later calls only re-resolve the scope.
    pub fn init(&mut self, config: &RouterConfig, app: &AppConfig) {
        self.protocol = config.protocol.clone().unwrap_or_else(|| app.protocol.clone());
        self.hostname = config.hostname.clone().or_else(|| app.hostname.clone());
        self.path_prefix = Some(
            config
                .path_prefix
                .clone()
                .unwrap_or_else(|| app.path_prefix.clone()),
        );

        if self.initialized {
            warn!(router = %self.name, "Router already initialized, init hook skipped");
            return;
        }
        self.initialized = true;
        if let Some(hook) = &config.init_hook {
            hook(self);
        }

        debug!(
            router = %self.name,
            protocol = %self.protocol,
            hostname = ?self.hostname,
            path_prefix = ?self.path_prefix,
            "Router initialized"
        );
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node this router occupies at the root of a propagation path.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// The configured prefix, `/` when none.
    #[must_use]
    pub fn path_prefix(&self) -> &str {
        self.path_prefix.as_deref().unwrap_or("/")
    }

    pub fn set_protocol(&mut self, protocol: &str) {
        self.protocol = protocol.to_string();
    }

    pub fn set_hostname(&mut self, hostname: Option<&str>) {
        self.hostname = hostname.map(str::to_string);
    }

    pub fn set_path_prefix(&mut self, prefix: Option<&str>) {
        self.path_prefix = prefix.map(str::to_string);
    }

    /// `protocol://hostname`, with `localhost` when no hostname is set.
    #[must_use]
    pub fn origin(&self) -> String {
        format!(
            "{}://{}",
            self.protocol,
            self.hostname.as_deref().unwrap_or("localhost")
        )
    }

    /// `protocol://hostname` followed by the path prefix.
    #[must_use]
    pub fn base_uri(&self) -> String {
        format!("{}{}", self.origin(), self.path_prefix())
    }

    /// Append an action. Declaration order is match order.
    pub fn add_action(&mut self, action: Arc<Action>) {
        self.actions.push(action);
    }

    #[must_use]
    pub fn actions(&self) -> &[Arc<Action>] {
        &self.actions
    }

    /// Whether `request` falls inside this router's scope: the hostname
    /// must be equal and the path must start with the prefix, each only
    /// when configured.
    #[must_use]
    pub fn match_request(&self, request: &Request) -> bool {
        if let Some(hostname) = &self.hostname {
            if hostname != request.hostname() {
                debug!(
                    router = %self.name,
                    expected = %hostname,
                    hostname = %request.hostname(),
                    "Router scope mismatch on hostname"
                );
                return false;
            }
        }
        if let Some(prefix) = &self.path_prefix {
            if !matcher::has_path_prefix(request.path(), prefix) {
                debug!(
                    router = %self.name,
                    prefix = %prefix,
                    path = %request.path(),
                    "Router scope mismatch on path prefix"
                );
                return false;
            }
        }
        true
    }

    /// First action, in declaration order, that matches `request`, with the
    /// parameters its pattern extracted.
    #[must_use]
    pub fn resolve(&self, request: &Request) -> Option<(Arc<Action>, Input)> {
        let method = request.method();
        let path = request.path();
        debug!(router = %self.name, method = %method, path = %path, "Action match attempt");

        let match_start = Instant::now();
        let found = self
            .actions
            .iter()
            .find_map(|action| action.match_request(request).map(|params| (Arc::clone(action), params)));
        let match_duration = match_start.elapsed();

        match &found {
            Some((action, params)) => {
                let pattern = action.pattern().map(|p| p.source()).unwrap_or_default();
                if match_duration > SLOW_MATCH {
                    warn!(
                        router = %self.name,
                        method = %method,
                        path = %path,
                        action = %action.name(),
                        pattern = %pattern,
                        params = ?params,
                        duration_us = match_duration.as_micros(),
                        "Slow action matching detected"
                    );
                } else {
                    info!(
                        router = %self.name,
                        method = %method,
                        path = %path,
                        action = %action.name(),
                        pattern = %pattern,
                        params = ?params,
                        duration_us = match_duration.as_micros(),
                        "Action matched"
                    );
                }
            }
            None => {
                warn!(
                    router = %self.name,
                    method = %method,
                    path = %path,
                    candidates = self.actions.len(),
                    duration_us = match_duration.as_micros(),
                    "No action matched"
                );
            }
        }
        found
    }

    /// Route a request event.
    ///
    /// On a match the URI parameters are merged into the request, the path
    /// is extended with the action's controller and the action, and the
    /// action becomes the event's target. Otherwise a 404 response is
    /// scheduled and the request event is discarded.
    pub fn handle(&self, event: &mut Event) {
        let Some(request) = event.request_data() else {
            return;
        };

        match self.resolve(request) {
            Some((action, params)) => {
                if let Some(request) = event.request_data_mut() {
                    request.merge_uri_input(&params);
                }
                let path = event.path_mut();
                path.push(action.controller_node());
                path.push(action.node().clone());
                event.set_target(action.node().clone());
            }
            None => self.trigger_not_found(event),
        }
    }

    /// Schedule a 404 and discard the request event.
    pub fn trigger_not_found(&self, event: &mut Event) {
        event.set_auto_trigger(Event::response(ResponseEvent::NotFound));
        event.discard();
    }

    /// Print the router scope and its actions to stdout.
    pub fn dump_routes(&self) {
        println!(
            "[router] {} base_uri={} actions={}",
            self.name,
            self.base_uri(),
            self.actions.len()
        );
        for action in &self.actions {
            let methods = if action.allowed_methods().is_empty() {
                "ANY".to_string()
            } else {
                action
                    .allowed_methods()
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            };
            println!(
                "[action] {methods} {} -> {}::{}{}",
                action.pattern().map(|p| p.source()).unwrap_or("-"),
                action.controller(),
                action.method(),
                if action.is_valid() { "" } else { " (invalid)" }
            );
        }
    }
}
