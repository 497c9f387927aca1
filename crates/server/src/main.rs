//! Webdir Server
//!
//! HTTP file browser for a single directory tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use server::config::{Config, LoggingConfig};
use server::http;

/// Webdir Server - expose a directory tree over HTTP.
///
/// Every operation is disabled until switched on with an allow flag, so
/// the bare invocation serves a tree nobody can do anything with.
#[derive(Parser, Debug)]
#[command(name = "webdir-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory to serve (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Bind host, an IP address literal (default: 0.0.0.0)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Bind port (default: 9999)
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Serve HTTPS, with a self-signed certificate unless the
    /// configuration names a PEM pair
    #[arg(long)]
    pub https: bool,

    /// Require HTTP basic authentication
    #[arg(long, value_name = "USER:PASS")]
    pub basic_auth: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Allow directory listings
    #[arg(short = 'l', long)]
    pub allow_list: bool,

    /// Allow file downloads
    #[arg(short = 'r', long)]
    pub allow_read: bool,

    /// Allow folder creation
    #[arg(short = 'c', long)]
    pub allow_create: bool,

    /// Allow file uploads
    #[arg(short = 'w', long)]
    pub allow_write: bool,

    /// Allow deletion of files and folders
    #[arg(short = 'd', long)]
    pub allow_delete: bool,

    /// Allow every operation
    #[arg(short = 'a', long)]
    pub allow_all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides, then command-line flags
    config.apply_env_overrides();
    apply_cli_overrides(&mut config, &cli);

    let _log_guard = init_logging(&config.logging)?;

    config.validate().context("Invalid configuration")?;

    tracing::info!(
        root = %config.server.root.display(),
        host = %config.server.host,
        port = config.server.port,
        https = config.tls.enabled,
        auth = config.auth.basic_auth.is_some(),
        "Settings"
    );
    let enabled = config.access.enabled_operations();
    if enabled.is_empty() {
        tracing::warn!("No operations are enabled; every request will be refused");
    } else {
        tracing::info!(enabled = ?enabled, "Permissions");
    }

    http::serve(config).await
}

/// Fold command-line flags into the configuration. Flags win over both
/// the file and the environment; absent flags change nothing.
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(root) = &cli.root {
        config.server.root = root.clone();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.https {
        config.tls.enabled = true;
    }
    if let Some(basic_auth) = &cli.basic_auth {
        config.auth.basic_auth = Some(basic_auth.clone());
    }
    if cli.debug {
        config.logging.log_level = "debug".to_string();
    }
    if cli.allow_list {
        config.access.list = true;
    }
    if cli.allow_read {
        config.access.read = true;
    }
    if cli.allow_create {
        config.access.create = true;
    }
    if cli.allow_write {
        config.access.write = true;
    }
    if cli.allow_delete {
        config.access.delete = true;
    }
    if cli.allow_all {
        config.access.all = true;
    }
}

/// Initialize tracing to stderr or, when configured, to a log file.
///
/// Returns the appender guard for file logging; dropping it flushes
/// buffered lines, so it must live until the process exits.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.log_level.clone()));

    match &logging.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}
