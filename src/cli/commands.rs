use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::echo::echo_dispatcher;
use crate::manifest::Manifest;
use crate::server::{Request, RequestDescriptor};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Command-line interface for the action dispatcher
#[derive(Parser, Debug)]
#[command(name = "actiondispatch")]
#[command(about = "Inspect and exercise MVC route manifests", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every router and its actions in match order
    Routes {
        /// Route manifest (YAML or JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Take the application context from ACTIONDISPATCH_* variables
        #[arg(long, default_value_t = false)]
        app_from_env: bool,
    },
    /// Generate the URI of an action from positional parameters
    Reverse {
        /// Route manifest (YAML or JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Action name
        #[arg(short, long)]
        action: String,

        /// Placeholder values, in pattern order
        params: Vec<String>,

        /// Print only the path, without protocol and hostname
        #[arg(long, default_value_t = false)]
        path_only: bool,
    },
    /// Dispatch one request against echo controllers and print the response
    Dispatch {
        /// Route manifest (YAML or JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// HTTP method
        #[arg(long, default_value = "GET")]
        method: String,

        /// Absolute URI or origin-form path
        #[arg(long, required_unless_present = "request_file")]
        uri: Option<String>,

        /// Header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(long)]
        body: Option<String>,

        /// Raw HTTP/1.x request file, instead of --method/--uri
        #[arg(long, conflicts_with = "uri")]
        request_file: Option<PathBuf>,

        /// Take the application context from ACTIONDISPATCH_* variables
        #[arg(long, default_value_t = false)]
        app_from_env: bool,
    },
}

/// Parse the process arguments and execute the command.
///
/// # Errors
///
/// Returns an error if:
/// - The manifest cannot be loaded or does not build
/// - Reverse routing fails
/// - The request cannot be constructed or the dispatch fails
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}

/// Execute an already parsed command.
///
/// # Errors
///
/// See [`run_cli`].
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Routes { manifest, app_from_env } => {
            let dispatcher = load(&manifest, app_from_env)?;
            dispatcher.dump_routes();
            Ok(())
        }
        Commands::Reverse {
            manifest,
            action,
            params,
            path_only,
        } => {
            let dispatcher = load(&manifest, false)?;
            let uri = if path_only {
                dispatcher.reverse_path(&action, &params)?
            } else {
                dispatcher.reverse_uri(&action, &params)?
            };
            println!("{uri}");
            Ok(())
        }
        Commands::Dispatch {
            manifest,
            method,
            uri,
            headers,
            body,
            request_file,
            app_from_env,
        } => {
            let dispatcher = load(&manifest, app_from_env)?;
            let request = match request_file {
                Some(path) => Request::from_file(&path)
                    .with_context(|| format!("reading request from {}", path.display()))?,
                None => {
                    let uri = uri.context("--uri is required without --request-file")?;
                    Request::from_descriptor(descriptor(&method, &uri, &headers, body)?)?
                }
            };
            let response = dispatcher.respond(request);
            print!("{}", response.to_wire());
            Ok(())
        }
    }
}

fn load(path: &Path, app_from_env: bool) -> anyhow::Result<Dispatcher> {
    let mut manifest = Manifest::load(path)?;
    if app_from_env {
        manifest.set_app(AppConfig::from_env());
    }
    Ok(echo_dispatcher(manifest)?)
}

/// Build a request descriptor from command-line parts.
///
/// # Errors
///
/// A header without a `:` separator.
pub fn descriptor(
    method: &str,
    uri: &str,
    headers: &[String],
    body: Option<String>,
) -> anyhow::Result<RequestDescriptor> {
    let mut desc = RequestDescriptor::new(method, uri);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header `{header}` is not `Name: value`"))?;
        desc = desc.header(name.trim(), value.trim());
    }
    if let Some(body) = body {
        desc = desc.body(body);
    }
    Ok(desc)
}
