//! Error taxonomy for the dispatch engine.
//!
//! Match and validation failures are not errors: they are handled inside the
//! engine by discarding the request event and auto-triggering a response
//! event. The types below cover what escapes to the caller:
//!
//! - [`ConfigError`] - raised while building routers and actions (fail fast)
//! - [`RequestError`] - an inbound request could not be constructed
//! - [`ReverseError`] - reverse routing could not produce a URI
//! - [`DispatchError`] - a dispatch cycle aborted (hard failure, data access)

use thiserror::Error;

/// Initialization-time configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The URI pattern could not be compiled.
    #[error("invalid URI pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The human-authored pattern
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// A typed placeholder used a type letter the matcher does not know.
    #[error("unknown placeholder type `{kind}` in pattern `{pattern}`")]
    UnknownPlaceholderType {
        /// The human-authored pattern
        pattern: String,
        /// The offending type letter(s)
        kind: String,
    },

    /// Two actions were registered under the same name.
    #[error("duplicate action name `{0}`")]
    DuplicateAction(String),

    /// Two routers were registered under the same name.
    #[error("duplicate router name `{0}`")]
    DuplicateRouter(String),

    /// The action binds to a controller that is not registered.
    #[error("action `{action}` references unknown controller `{controller}`")]
    UnknownController {
        /// Action name
        action: String,
        /// Controller name
        controller: String,
    },

    /// The controller exists but does not expose the bound method.
    #[error("controller `{controller}` has no method `{method}` (action `{action}`)")]
    UnknownControllerMethod {
        /// Action name
        action: String,
        /// Controller name
        controller: String,
        /// Method name
        method: String,
    },

    /// The action references a validator that is not registered.
    #[error("action `{action}` references unknown validator `{validator}`")]
    UnknownValidator {
        /// Action name
        action: String,
        /// Validator name
        validator: String,
    },

    /// A controller method requires a service that is not registered.
    #[error("method `{method}` of controller `{controller}` requires unknown service `{service}`")]
    UnknownService {
        /// Controller name
        controller: String,
        /// Method name
        method: String,
        /// Service name
        service: String,
    },

    /// The action is configured to run inside a transaction but its
    /// controller has no data-access collaborator.
    #[error("action `{action}` requires a transaction but controller `{controller}` has no data access")]
    MissingDataAccess {
        /// Action name
        action: String,
        /// Controller name
        controller: String,
    },

    /// The HTTP method is not one of the supported verbs.
    #[error("unsupported HTTP method `{0}`")]
    InvalidMethod(String),

    /// The route manifest could not be read.
    #[error("failed to read manifest `{path}`: {source}")]
    ManifestIo {
        /// Manifest path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The route manifest could not be parsed.
    #[error("failed to parse manifest: {0}")]
    ManifestParse(String),
}

/// Failure to construct a [`Request`](crate::server::Request).
#[derive(Error, Debug)]
pub enum RequestError {
    /// The request line or headers are malformed.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The method is not one of the supported verbs.
    #[error("unsupported HTTP method `{0}`")]
    UnknownMethod(String),

    /// The request URI could not be parsed.
    #[error("invalid request URI `{uri}`: {source}")]
    InvalidUri {
        /// Raw URI
        uri: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },

    /// The JSON body could not be decoded.
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// The request file could not be read.
    #[error("failed to read request file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to generate a URI from an action pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReverseError {
    /// No action is registered under this name.
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// Fewer positional parameters than placeholders were supplied.
    #[error("pattern `{pattern}` has {expected} placeholder(s) but {given} parameter(s) were given")]
    MissingParams {
        /// The pattern being reversed
        pattern: String,
        /// Number of placeholders
        expected: usize,
        /// Number of supplied parameters
        given: usize,
    },
}

/// A dispatch cycle aborted and the error is re-raised to the caller.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The controller method raised. The transaction (if any) has already
    /// been rolled back and the hard-fail hook has run.
    #[error("action `{action}` failed: {source}")]
    Execution {
        /// Action name
        action: String,
        /// The controller's error
        #[source]
        source: anyhow::Error,
    },

    /// Opening, committing or rolling back a transaction failed.
    #[error("transaction error in action `{action}`: {source}")]
    Transaction {
        /// Action name
        action: String,
        /// The data-access error
        #[source]
        source: anyhow::Error,
    },

    /// A listener returned an error.
    #[error("listener on `{node}` failed: {source}")]
    Listener {
        /// Node the listener is registered on
        node: String,
        /// The listener's error
        #[source]
        source: anyhow::Error,
    },

    /// Reverse routing failed while a hook was building a redirect.
    #[error(transparent)]
    Reverse(#[from] ReverseError),

    /// Auto-triggered events kept scheduling successors.
    #[error("auto-trigger chain exceeded {0} event cycles")]
    CycleLimit(usize),
}
