//! `sn report` — aggregate a snapshot into an SLA compliance report.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use siren_core::aggregate::{AggregateOptions, AggregateReport, Aggregator};
use siren_core::config::EngineConfig;
use siren_core::model::item::WorkItem;
use siren_core::monitor::{self, ComplianceWarning};

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `sn report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Snapshot file (JSON array of work items); reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Anchor the report at this instant instead of the wall clock (RFC 3339).
    #[arg(long)]
    now: Option<DateTime<Utc>>,

    /// Override the configured priority-list cap.
    #[arg(long)]
    limit: Option<usize>,

    /// Override the configured aggregation budget, in milliseconds.
    #[arg(long)]
    budget_ms: Option<u64>,
}

/// Report payload for `sn report`: the aggregate report plus any compliance
/// warnings.
#[derive(Debug, Serialize)]
struct ReportPayload {
    #[serde(flatten)]
    report: AggregateReport,
    warnings: Vec<ComplianceWarning>,
}

/// Execute `sn report`.
pub fn run_report(
    args: &ReportArgs,
    output: OutputMode,
    config: &EngineConfig,
) -> anyhow::Result<()> {
    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read snapshot from stdin")?;
            buf
        }
    };

    let items: Vec<WorkItem> = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(err) => {
            render_error(
                output,
                &CliError::with_details(
                    format!("invalid snapshot: {err}"),
                    "expected a JSON array of work items",
                    "invalid_snapshot",
                ),
            )?;
            anyhow::bail!("snapshot parse failed");
        }
    };

    let now = args.now.unwrap_or_else(Utc::now);

    let mut options = AggregateOptions {
        priority_limit: config.report.priority_limit,
        budget: config.report.budget_ms.map(Duration::from_millis),
    };
    if let Some(limit) = args.limit {
        options.priority_limit = limit;
    }
    if let Some(ms) = args.budget_ms {
        options.budget = Some(Duration::from_millis(ms));
    }

    let aggregator = Aggregator::new(config.catalog(), config.hours, options);
    let report = aggregator.aggregate(&items, now);
    let warnings = monitor::evaluate(&report, &config.monitor);

    let payload = ReportPayload { report, warnings };
    render(output, &payload, |payload, w| render_report_human(payload, w))
}

fn render_sorted_map(map: &HashMap<String, usize>) -> Vec<(&str, usize)> {
    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_unstable_by(|(ka, va), (kb, vb)| vb.cmp(va).then_with(|| ka.cmp(kb)));
    entries
}

fn render_report_human(payload: &ReportPayload, w: &mut dyn Write) -> std::io::Result<()> {
    let report = &payload.report;

    writeln!(w, "SLA compliance report")?;
    if report.truncated {
        writeln!(w, "  (partial: budget exhausted before the full snapshot)")?;
    }

    writeln!(w, "\nItems by level:")?;
    for (level, count) in render_sorted_map(&report.level_distribution) {
        writeln!(w, "  {level}: {count}")?;
    }

    writeln!(w, "\nItems by status:")?;
    for (status, count) in render_sorted_map(&report.status_distribution) {
        writeln!(w, "  {status}: {count}")?;
    }

    writeln!(w, "\nItems by type:")?;
    for (item_type, count) in render_sorted_map(&report.type_distribution) {
        writeln!(w, "  {item_type}: {count}")?;
    }

    writeln!(w, "\nSLA compliance:")?;
    writeln!(
        w,
        "  response:   {}% ({}/{} measured, avg {:.1}m)",
        report.sla.response.rate,
        report.sla.response.compliant,
        report.sla.response.measured,
        report.sla.avg_response_minutes
    )?;
    writeln!(
        w,
        "  resolution: {}% ({}/{} measured, avg {:.1}h)",
        report.sla.resolution.rate,
        report.sla.resolution.compliant,
        report.sla.resolution.measured,
        report.sla.avg_resolution_hours
    )?;

    writeln!(w, "\nCreated business hours / after hours:")?;
    writeln!(
        w,
        "  {} / {}",
        report.business_hours.business, report.business_hours.after_hours
    )?;

    writeln!(w, "\nRecent trends (today / yesterday / week):")?;
    writeln!(
        w,
        "  {} / {} / {}",
        report.trends.today, report.trends.yesterday, report.trends.week
    )?;

    if !report.priority_items.is_empty() {
        writeln!(w, "\nNeeds attention:")?;
        for item in &report.priority_items {
            writeln!(
                w,
                "  {}  level {}  {}  waiting {}",
                item.id, item.level, item.item_type, item.age
            )?;
        }
    }

    if report.skipped_count > 0 {
        writeln!(w, "\nSkipped {} malformed row(s):", report.skipped_count)?;
        for skipped in &report.skipped {
            writeln!(w, "  {}: {}", skipped.id, skipped.reason)?;
        }
    }

    if payload.warnings.is_empty() {
        writeln!(w, "\nAll compliance thresholds met.")?;
    } else {
        writeln!(w, "\nCompliance warnings:")?;
        for warning in &payload.warnings {
            writeln!(
                w,
                "  {} compliance {}% is below the {}% threshold",
                warning.metric, warning.value, warning.threshold
            )?;
        }
    }

    writeln!(
        w,
        "\nTotal items: {} ({} counted)",
        report.total_items,
        report.total_items - report.skipped_count
    )?;

    Ok(())
}
