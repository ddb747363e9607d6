//! accbc - ACC broadcasting listener
//!
//! Registers with the simulator's broadcasting interface, prints every
//! delivered event and unregisters on Ctrl-C.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod completion;
mod output;

use std::path::PathBuf;

use acc_broadcast_client::{BroadcastClient, ClientConfig, ClientError, ClientEvent, ConfigError};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "accbc")]
#[command(about = "Listen to the ACC broadcasting interface and print what it sends")]
#[command(version)]
#[command(long_about = "
accbc registers as a broadcasting client with Assetto Corsa Competizione,
keeps the entry list up to date and prints every session, car and race
event it receives. Settings are layered: built-in defaults, then --config,
then the simulator's broadcasting.json, then individual flags.

Use --json for one JSON object per line, suitable for piping into jq.
")]
struct Cli {
    /// Output format (human-readable or JSON lines)
    #[arg(long, global = true, help = "Print events and errors as JSON lines")]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and print events until Ctrl-C
    Listen(ConnectionArgs),

    /// Print the effective configuration as YAML
    Config(ConnectionArgs),

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// YAML or JSON client configuration
    #[arg(short, long, env = "ACCBC_CONFIG")]
    config: Option<PathBuf>,

    /// The simulator's broadcasting.json (port and passwords)
    #[arg(long, env = "ACCBC_BROADCASTING_JSON")]
    broadcasting_json: Option<PathBuf>,

    /// Simulator address as host:port
    #[arg(short, long, env = "ACCBC_ADDRESS")]
    address: Option<String>,

    /// Name shown in the simulator's client list
    #[arg(long, env = "ACCBC_DISPLAY_NAME")]
    display_name: Option<String>,

    /// Connection password
    #[arg(long, env = "ACCBC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Command password; empty registers read-only
    #[arg(long, env = "ACCBC_COMMAND_PASSWORD", hide_env_values = true)]
    command_password: Option<String>,

    /// Realtime update interval requested from the simulator
    #[arg(long)]
    update_interval_ms: Option<i32>,

    /// Send and receive timeout
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Delay before reconnecting after a failure
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,
}

impl ConnectionArgs {
    /// Layer defaults, config file, broadcasting.json and flags.
    fn resolve(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(path) = &self.broadcasting_json {
            config
                .apply_acc_broadcasting_file(path)
                .with_context(|| format!("reading {}", path.display()))?;
        }

        if let Some(address) = &self.address {
            config.address.clone_from(address);
        }
        if let Some(name) = &self.display_name {
            config.display_name.clone_from(name);
        }
        if let Some(password) = &self.password {
            config.connection_password.clone_from(password);
        }
        if let Some(password) = &self.command_password {
            config.command_password.clone_from(password);
        }
        if let Some(interval) = self.update_interval_ms {
            config.update_interval_ms = interval;
        }
        if let Some(timeout) = self.timeout_ms {
            config.timeout_ms = timeout;
        }
        if let Some(delay) = self.reconnect_delay_ms {
            config.reconnect_delay_ms = delay;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Events go to stdout, so logs stay on stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "accbc={log_level},acc_broadcast_client={log_level},acc_broadcast_protocol={log_level}"
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = execute_command(&cli).await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            std::process::exit(exit_code(&e));
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Listen(args) => listen(args.resolve()?, cli.json).await,
        Commands::Config(args) => {
            let config = args.resolve()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
            Ok(())
        }
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}

async fn listen(config: ClientConfig, json: bool) -> Result<()> {
    info!(address = %config.address, "starting broadcast listener");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ClientEvent>();
    let (mut client, handle) = BroadcastClient::new(config, events_tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if json {
                output::print_event_json(&event);
            } else {
                output::print_event_human(&event);
            }
        }
    });

    let signals = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, disconnecting");
            handle.request_disconnect();
        }
    });

    let result = client.run().await;
    signals.abort();
    // The client owns the event sender; dropping it lets the printer drain and exit.
    drop(client);
    printer.await.context("event printer panicked")?;

    result.context("broadcast client stopped")
}

/// Process exit status for a failed command.
fn exit_code(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    match error.downcast_ref::<ClientError>() {
        Some(ClientError::Config(_)) => 2,
        Some(ClientError::BufferOverflow { .. }) => 4,
        _ => 1,
    }
}
