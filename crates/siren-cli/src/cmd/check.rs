//! `sn check` / `sn next` — transition legality queries.

use clap::Args;
use serde::Serialize;
use siren_core::error::ErrorCode;
use siren_core::model::item::Status;

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `sn check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Current status.
    from: Status,

    /// Requested status.
    to: Status,
}

/// Arguments for `sn next`.
#[derive(Args, Debug)]
pub struct NextArgs {
    /// Current status.
    from: Status,
}

#[derive(Debug, Serialize)]
struct CheckPayload {
    from: Status,
    to: Status,
    allowed: bool,
}

#[derive(Debug, Serialize)]
struct NextPayload {
    from: Status,
    terminal: bool,
    next: &'static [Status],
}

fn allowed_targets(from: Status) -> String {
    let targets = from.next_statuses();
    if targets.is_empty() {
        return "none (terminal)".to_string();
    }

    targets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Execute `sn check`.
pub fn run_check(args: &CheckArgs, output: OutputMode) -> anyhow::Result<()> {
    match args.from.ensure_transition(args.to) {
        Ok(()) => render(
            output,
            &CheckPayload {
                from: args.from,
                to: args.to,
                allowed: true,
            },
            |payload, w| writeln!(w, "{} -> {} is allowed", payload.from, payload.to),
        ),
        Err(err) => {
            render_error(
                output,
                &CliError::with_details(
                    err.to_string(),
                    format!("allowed from {}: {}", args.from, allowed_targets(args.from)),
                    ErrorCode::InvalidStateTransition.code(),
                ),
            )?;
            anyhow::bail!("transition rejected");
        }
    }
}

/// Execute `sn next`.
pub fn run_next(args: &NextArgs, output: OutputMode) -> anyhow::Result<()> {
    let payload = NextPayload {
        from: args.from,
        terminal: args.from.is_terminal(),
        next: args.from.next_statuses(),
    };

    render(output, &payload, |payload, w| {
        writeln!(w, "{} -> {}", payload.from, allowed_targets(payload.from))
    })
}
