//! paynotify
//!
//! Offline verification of captured acquiring-bank callback notifications.

mod config;
mod report;

use clap::{Parser, ValueEnum};
use config::{ConfigLoader, get_secret_override};
use paynotify_sdk::{Notification, Scheme};
use report::Report;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How the captured callback was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// JSON object body
    Json,
    /// GET query string
    Query,
}

/// paynotify - verify acquiring-bank callback notifications
#[derive(Parser, Debug)]
#[command(name = "paynotify")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./paynotify.toml")]
    config: PathBuf,

    /// File holding the captured callback (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Callback encoding
    #[arg(short, long, value_enum, default_value_t = InputFormat::Json)]
    format: InputFormat,

    /// Override the configured checksum scheme (hmac or rsa)
    #[arg(short, long)]
    scheme: Option<Scheme>,

    /// Accept payloads missing required fields; the operation is still checked
    #[arg(long, default_value = "false")]
    skip_structure_check: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let args = Args::parse();

    tracing::debug!("Starting paynotify v{}", env!("CARGO_PKG_VERSION"));

    let loaded_config = ConfigLoader::new(&args.config, args.scheme)
        .with_secret_override(get_secret_override())
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;
    tracing::debug!("Configuration loaded from {:?}", args.config);

    let check_structure = loaded_config.check_structure && !args.skip_structure_check;

    let raw = read_input(args.input.as_deref()).map_err(|e| {
        tracing::error!("Failed to read callback payload: {}", e);
        e
    })?;
    let raw = raw.trim();

    let notification = match args.format {
        InputFormat::Json => Notification::parse(raw, check_structure),
        InputFormat::Query => Notification::from_query(raw, check_structure),
    }
    .map_err(|e| {
        tracing::error!("Rejected callback notification: {}", e);
        e
    })?;

    let scheme = loaded_config.scheme;
    let verified = loaded_config
        .keys
        .verify(&notification, scheme)
        .ok_or_else(|| anyhow::anyhow!("no key material configured for scheme {scheme}"))?;

    let report = Report::new(&notification, scheme, verified);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if verified {
        tracing::info!(
            md_order = notification.md_order(),
            operation = %notification.operation(),
            "Checksum verified"
        );
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(
            md_order = notification.md_order(),
            %scheme,
            "Checksum did not verify, do not trust this notification"
        );
        Ok(ExitCode::FAILURE)
    }
}

/// Read the whole payload from `path`, or from stdin when absent.
fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
///
/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
