//! `ledipc`: LED manager service and its interactive clients.
//!
//! One binary, three personalities:
//!
//! ```text
//! ledipc --led-manager                  run the LED manager server
//! ledipc --update-led [--led<N> ...]    switch LEDs on/off
//! ledipc --query-led                    read LED states
//! ```
//!
//! # Options
//!
//! ```text
//!   --config <PATH>       TOML configuration file        [env: LEDIPC_CONFIG]
//!   --endpoint <ADDR>     unix:///path, /path or tcp://host:port
//!                                                         [env: LEDIPC_ENDPOINT]
//!   --store-root <DIR>    root of the LED state tree (manager only)
//!   --memory-store        keep LED states in memory (manager only)
//!   --log-stderr          log to stderr instead of /tmp/<Service>.log
//! ```
//!
//! `--led<N>` flags are only accepted together with `--update-led`; each one
//! switches LED `N` on before the interactive loop starts.
//!
//! # Exit codes
//!
//! `0` on normal termination (including `--help`), `1` on a usage error or a
//! runtime failure such as the manager not being reachable.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{ArgGroup, CommandFactory, Parser};
use tokio::io::BufReader;
use tracing::{error, info};

use ledipc_manager::application::console::Console;
use ledipc_manager::application::led_client::LedClient;
use ledipc_manager::application::query_led::run_query_led;
use ledipc_manager::application::route_request::RequestRouter;
use ledipc_manager::application::update_led::run_update_led;
use ledipc_manager::application::Personality;
use ledipc_manager::infrastructure::logging::init_logging;
use ledipc_manager::infrastructure::state_store::{FileStateStore, MemoryStateStore, StateStore};
use ledipc_manager::infrastructure::storage::config::{load_config, AppConfig, Role};
use ledipc_transport::{CancellationToken, Endpoint, Server};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// LED manager service and its update/query clients.
#[derive(Debug, Parser)]
#[command(name = "ledipc", about = "LED manager service and its update/query clients", version)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["led_manager", "update_led", "query_led"])
))]
struct Cli {
    /// Run the LedManager server.
    #[arg(long)]
    led_manager: bool,

    /// Run the UpdateLed client.
    #[arg(long)]
    update_led: bool,

    /// Run the QueryLed client.
    #[arg(long)]
    query_led: bool,

    /// TOML configuration file.  Built-in defaults apply when it is absent.
    #[arg(long, env = "LEDIPC_CONFIG")]
    config: Option<PathBuf>,

    /// Endpoint of the manager, overriding the configuration file.
    #[arg(long, env = "LEDIPC_ENDPOINT")]
    endpoint: Option<String>,

    /// Root directory of the LED state tree, overriding the configuration file.
    #[arg(long, conflicts_with = "memory_store")]
    store_root: Option<PathBuf>,

    /// Keep LED states in memory; they are lost when the manager stops.
    #[arg(long)]
    memory_store: bool,

    /// Log to stderr instead of the per-service log file.
    #[arg(long)]
    log_stderr: bool,

    /// LEDs to switch on at startup, collected from `--led<N>` flags.
    #[arg(skip)]
    led_targets: Vec<String>,
}

impl Cli {
    fn personality(&self) -> Personality {
        if self.led_manager {
            Personality::LedManager
        } else if self.update_led {
            Personality::UpdateLed
        } else {
            Personality::QueryLed
        }
    }

    /// Applies command-line overrides on top of the loaded configuration.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.transport.endpoint = endpoint.clone();
        }
        if let Some(root) = &self.store_root {
            config.store.root = root.clone();
        }
    }
}

/// Pulls `--led<N>` flags (N all digits) out of `args`.
///
/// clap cannot describe a flag whose name carries its value, so these are
/// removed before parsing.  Returns `(remaining_args, led_targets)`.
fn split_led_flags<I>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut remaining = Vec::new();
    let mut targets = Vec::new();
    for arg in args {
        match arg.strip_prefix("--led") {
            Some(n) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => {
                targets.push(n.to_string());
            }
            _ => remaining.push(arg),
        }
    }
    (remaining, targets)
}

/// Parses the full argument list, program name included.
fn parse_cli<I>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = String>,
{
    let (remaining, led_targets) = split_led_flags(args);
    let mut cli = Cli::try_parse_from(remaining)?;
    if !led_targets.is_empty() && !cli.update_led {
        return Err(Cli::command().error(
            ErrorKind::ArgumentConflict,
            "--led<N> can only be used with --update-led",
        ));
    }
    cli.led_targets = led_targets;
    Ok(cli)
}

fn resolve_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ── Personalities ─────────────────────────────────────────────────────────────

async fn run_manager(config: &AppConfig, endpoint: Endpoint, memory_store: bool) -> anyhow::Result<()> {
    let store: Arc<dyn StateStore> = if memory_store {
        info!("using in-memory state store");
        Arc::new(MemoryStateStore::new())
    } else {
        info!(root = %config.store.root.display(), "using file state store");
        Arc::new(FileStateStore::new(config.store.root.clone()))
    };

    let server = Server::bind(endpoint, config.server_config())
        .await
        .context("failed to start the LED manager")?;
    println!("LedManager listening on {}", server.endpoint());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                signal_token.cancel();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    server
        .serve(Arc::new(RequestRouter::new(store)), shutdown)
        .await;
    info!("LedManager stopped");
    Ok(())
}

async fn connect_client(config: &AppConfig, endpoint: Endpoint) -> anyhow::Result<LedClient> {
    let display = endpoint.to_string();
    LedClient::connect(endpoint, config.connection_config(Role::Client))
        .await
        .with_context(|| format!("cannot reach the LED manager at {display}"))
}

fn stdio_console() -> Console<tokio::io::Stdout, tokio::io::Stderr> {
    Console::new(
        tokio::io::stdout(),
        tokio::io::stderr(),
        std::io::stdin().is_terminal(),
    )
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match parse_cli(std::env::args()) {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let config = resolve_config(&cli)?;
    let personality = cli.personality();
    let destination = init_logging(
        personality.service_name(),
        &config.log.directory,
        &config.log.level,
        cli.log_stderr,
    );
    info!(?destination, "{} starting", personality.service_name());

    let endpoint = config.endpoint()?;
    let result = match personality {
        Personality::LedManager => run_manager(&config, endpoint, cli.memory_store).await,
        Personality::UpdateLed => {
            let mut client = connect_client(&config, endpoint).await?;
            let mut console = stdio_console();
            let stdin = BufReader::new(tokio::io::stdin());
            run_update_led(&mut client, &cli.led_targets, stdin, &mut console)
                .await
                .context("console I/O failed")
        }
        Personality::QueryLed => {
            let mut client = connect_client(&config, endpoint).await?;
            let mut console = stdio_console();
            let stdin = BufReader::new(tokio::io::stdin());
            run_query_led(&mut client, stdin, &mut console)
                .await
                .context("console I/O failed")
        }
    };

    if let Err(e) = &result {
        error!("{} failed: {e:#}", personality.service_name());
    }
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
