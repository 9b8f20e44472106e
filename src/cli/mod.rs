//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod send;
pub mod serve;
pub mod settings;
pub mod threads;

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::api::client::HttpBackend;
use crate::core::backend::SharedBackend;
use crate::core::config::io::default_config_path;
use crate::core::config::{Config, Overrides, ResolvedConfig};
use crate::utils::logging::init_tracing;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ")\ncommit: ",
    env!("VERGEN_GIT_SHA"),
    "\nbuilt: ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    "\ntarget: ",
    env!("VERGEN_CARGO_TARGET_TRIPLE")
);

#[derive(Parser, Debug)]
#[command(name = "graphchat", version, long_version = LONG_VERSION)]
#[command(about = "Chat relay for LangGraph-style orchestration services")]
#[command(
    long_about = "graphchat talks to a LangGraph-compatible orchestration service. It can \
create threads, inspect their state, stream a single exchange to the terminal, or run an \
HTTP relay that front-ends use to stream threadless runs.\n\n\
Environment Variables:\n\
  LANGGRAPH_API_URL        Base URL of the orchestration service\n\
  LANGCHAIN_API_KEY        Credential sent as the x-api-key header\n\
  LANGGRAPH_ASSISTANT_ID   Graph to run (defaults to 'agent')\n\
  GRAPHCHAT_BIND           Address for 'graphchat serve'\n\
  GRAPHCHAT_PORT           Port for 'graphchat serve'\n\
  RUST_LOG                 Log filter (e.g. graphchat=debug)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the orchestration service
    #[arg(long, global = true, env = "LANGGRAPH_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// API key sent as x-api-key
    #[arg(long, global = true, env = "LANGCHAIN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Assistant (graph) id to run
    #[arg(long, global = true, env = "LANGGRAPH_ASSISTANT_ID", value_name = "ID")]
    pub assistant_id: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP relay
    Serve {
        /// Address to bind
        #[arg(long, env = "GRAPHCHAT_BIND")]
        bind: Option<String>,
        /// Port to listen on
        #[arg(long, env = "GRAPHCHAT_PORT")]
        port: Option<u16>,
        /// Serve from an in-memory echo backend instead of the remote service
        #[arg(long)]
        offline: bool,
    },
    /// Create a thread and print its id
    NewThread,
    /// Print the state of a thread as JSON
    State {
        /// Thread id
        thread_id: String,
    },
    /// Send one message and stream the reply to stdout
    Send {
        /// Continue this thread; without it the run is threadless
        #[arg(short, long, value_name = "THREAD_ID")]
        thread: Option<String>,
        /// Append the exchange to a transcript file
        #[arg(short, long, value_name = "FILE")]
        log: Option<PathBuf>,
        /// Message text
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set a configuration value
    Set {
        /// One of: api-url, api-key, assistant-id, server-bind, server-port, max-duration
        key: String,
        /// Value (multiple words are joined with spaces)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Remove a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Print the effective configuration
    Config,
}

/// Everything a subcommand needs: where the config lives, what it holds,
/// and the values in effect after flags and environment are applied.
pub struct CliContext {
    pub config_path: PathBuf,
    pub config: Config,
    pub overrides: Overrides,
    pub resolved: ResolvedConfig,
}

impl CliContext {
    pub fn load(args: &Args) -> Result<Self, Box<dyn Error>> {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let config = Config::load_from_path(&config_path)?;
        let overrides = Overrides {
            api_url: args.api_url.clone(),
            api_key: args.api_key.clone(),
            assistant_id: args.assistant_id.clone(),
            ..Overrides::default()
        };
        let resolved = ResolvedConfig::resolve(&config, &overrides);
        Ok(Self {
            config_path,
            config,
            overrides,
            resolved,
        })
    }

    /// Shared HTTP client for the orchestration service.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("graphchat/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
    }

    pub fn http_backend(&self) -> Result<SharedBackend, Box<dyn Error>> {
        Ok(std::sync::Arc::new(HttpBackend::new(
            self.http_client()?,
            &self.resolved.api_url,
            self.resolved.api_key.clone(),
        )))
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let ctx = CliContext::load(&args)?;

    match args.command {
        Commands::Serve {
            bind,
            port,
            offline,
        } => serve::run_serve(&ctx, bind, port, offline).await,
        Commands::NewThread => threads::run_new_thread(&ctx).await,
        Commands::State { thread_id } => threads::run_state(&ctx, thread_id).await,
        Commands::Send {
            thread,
            log,
            prompt,
        } => send::run_send(&ctx, thread, log, prompt).await,
        Commands::Set { key, value } => settings::run_set(&ctx, &key, &value.join(" ")),
        Commands::Unset { key } => settings::run_unset(&ctx, &key),
        Commands::Config => {
            ctx.resolved.print_all(&ctx.config_path);
            Ok(())
        }
    }
}
