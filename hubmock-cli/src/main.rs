//! hubmock CLI - trigger and debug signed webhooks toward the hub.
//!
//! # Commands
//!
//! - `hubmock send <type> <action>` - Dispatch one signed webhook
//! - `hubmock sign` - Print the `Authorization` value for a request
//! - `hubmock verify` - Check an `Authorization` value against a request
//! - `hubmock config` - Show the effective settings
//!
//! Settings come from the environment and an optional `.env` file;
//! `WEBHOOKS_SECRET` is required for every command.

use clap::{Args, Parser, Subcommand};
use hubmock_config::Settings;
use hubmock_webhooks::{Action, EventType};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

mod commands;
mod error;
mod logging;

use commands::RequestTarget;
use error::CliResult;

/// hubmock - signed webhook tooling for the scheduling mock
#[derive(Parser)]
#[command(name = "hubmock")]
#[command(version)]
#[command(about = "Trigger, sign and verify hubmock webhooks")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load settings from this .env file instead of ./.env
    #[arg(long, global = true, env = "HUBMOCK_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one signed webhook to the hub
    Send {
        /// Resource type (availability, appointment, resource, patient, service)
        event_type: EventType,

        /// What happened (create, update, delete)
        action: Action,

        /// JSON payload placed under `data`
        #[arg(long)]
        data: Option<String>,

        /// Add `uuid` and `last_modified_date` to the envelope
        #[arg(long)]
        legacy: bool,
    },

    /// Print the Authorization header value for a request
    Sign(TargetArgs),

    /// Verify an Authorization header value against a request
    Verify {
        /// The full header value, starting with `Signature`
        #[arg(long)]
        authorization: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Reject timestamps further than this many seconds from now
        #[arg(long)]
        tolerance: Option<u64>,
    },

    /// Show the effective settings (secret omitted)
    Config,
}

#[derive(Args)]
struct TargetArgs {
    /// Host header value, e.g. localhost:3000
    #[arg(long)]
    host: String,

    /// Request path, e.g. /webhooks/medesync/appointments
    #[arg(long)]
    path: String,

    /// Query string without the leading `?`
    #[arg(long, default_value = "")]
    query: String,

    /// Exact request body
    #[arg(long, default_value = "")]
    body: String,
}

impl From<TargetArgs> for RequestTarget {
    fn from(args: TargetArgs) -> Self {
        Self {
            host: args.host,
            path: args.path,
            query: args.query,
            body: args.body,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_env_file(cli.env_file.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_tracing(&settings, cli.verbose);

    match run(cli.command, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, settings: &Settings) -> CliResult<()> {
    match command {
        Commands::Send {
            event_type,
            action,
            data,
            legacy,
        } => commands::send(settings, event_type, action, data.as_deref(), legacy).await,
        Commands::Sign(target) => commands::sign(settings, &target.into()),
        Commands::Verify {
            authorization,
            target,
            tolerance,
        } => commands::verify(settings, &authorization, &target.into(), tolerance),
        Commands::Config => commands::show_config(settings),
    }
}
