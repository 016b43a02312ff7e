#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "siren: ticket/alert lifecycle and SLA compliance engine",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Engine config file (defaults to ./siren.toml, then the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Aggregate a snapshot into an SLA compliance report",
        long_about = "Aggregate a work-item snapshot (JSON array) into distributions, SLA compliance, trends, and a needs-attention list.",
        after_help = "EXAMPLES:\n    # Report over a snapshot file\n    sn report --input snapshot.json\n\n    # Reproducible run with a pinned clock\n    sn report --input snapshot.json --now 2026-08-04T12:00:00Z --json\n\n    # Pipe a snapshot in\n    cat snapshot.json | sn report"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        about = "Check whether a status transition is legal",
        after_help = "EXAMPLES:\n    # A legal edge\n    sn check pending assigned\n\n    # Rejected with the allowed targets\n    sn check pending_verify assigned"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        about = "List allowed target statuses",
        after_help = "EXAMPLES:\n    sn next in_progress\n    sn next closed --json"
    )]
    Next(cmd::check::NextArgs),

    #[command(
        about = "Show the resolved SLA policy for a level, or the whole catalog",
        after_help = "EXAMPLES:\n    sn policy 5\n    sn policy --json"
    )]
    Policy(cmd::policy::PolicyArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SIREN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "siren_core=debug,siren_cli=debug,info"
        } else {
            "siren_core=info,siren_cli=info,warn"
        })
    });

    let format = env::var("SIREN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = output::resolve_output_mode(cli.format, cli.json);
    let config = siren_core::config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Report(ref args) => cmd::report::run_report(args, output, &config),
        Commands::Check(ref args) => cmd::check::run_check(args, output),
        Commands::Next(ref args) => cmd::check::run_next(args, output),
        Commands::Policy(ref args) => cmd::policy::run_policy(args, output, &config),
    }
}
