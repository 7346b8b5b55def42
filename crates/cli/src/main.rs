//! gcs - Command-line client for Google Cloud Storage
//!
//! A thin shell over `gcs-core` and `gcs-http`: every command goes through
//! the same retrying, logging client an application would use.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_code;
mod output;

use commands::{Commands, GlobalOptions};
use exit_code::ExitCode;
use output::OutputConfig;

/// gcs - Google Cloud Storage from the command line
#[derive(Parser, Debug)]
#[command(name = "gcs", version, about, long_about = None)]
struct Cli {
    /// Print JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log requests and responses to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Project for bucket listing, bucket creation and service accounts
    #[arg(long, global = true, env = "GOOGLE_CLOUD_PROJECT")]
    project: Option<String>,

    /// API endpoint, e.g. a local emulator
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let filter = if debug {
        EnvFilter::new("gcs_core=debug,gcs_http=debug,gcs_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<std::process::ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let global = GlobalOptions {
        output: OutputConfig {
            json: cli.json,
            no_color: cli.no_color,
            quiet: cli.quiet,
        },
        project: cli.project,
        endpoint: cli.endpoint,
    };

    let code = tokio::select! {
        code = commands::execute(cli.command, global) => code,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            ExitCode::Interrupted
        }
    };
    Ok(code.into())
}
