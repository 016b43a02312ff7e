//! Single-pass aggregation of a `WorkItem` snapshot into an
//! [`AggregateReport`].
//!
//! The pass is O(n) over the snapshot with O(1) hash-keyed bucket updates,
//! sized for per-dashboard-refresh runs over thousands of items. A malformed
//! row (no `created_at`) is skipped and recorded, never fatal to the batch;
//! an optional wall-clock budget turns an oversized snapshot into a partial
//! report flagged `truncated` instead of a hang.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::debug;

use crate::classify::{self, BucketKeys};
use crate::config::BusinessHours;
use crate::model::item::{Status, WorkItem};
use crate::policy::PolicyCatalog;

/// How many items are processed between budget-clock checks.
const BUDGET_CHECK_INTERVAL: usize = 1024;

/// Bucket-key extraction strategy.
///
/// Ticket and alert domains share one aggregator; the per-domain variation
/// is how the (level, status, type) labels are derived, so that is the only
/// seam.
pub trait KeyStrategy {
    /// Distribution labels for one item.
    fn keys(&self, item: &WorkItem) -> BucketKeys {
        classify::bucket_keys(item)
    }
}

/// Default labels: numeric level, snake_case status, type bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeys;

impl KeyStrategy for DefaultKeys {}

/// Tuning for one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Maximum entries in [`AggregateReport::priority_items`].
    pub priority_limit: usize,
    /// Soft wall-clock budget; when exceeded the pass stops and the report
    /// is returned with `truncated: true`.
    pub budget: Option<Duration>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            priority_limit: 5,
            budget: None,
        }
    }
}

/// Compliance counters for one SLA metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SlaMetric {
    /// Items measured (the metric's timestamp was present).
    pub measured: usize,
    /// Measured items inside the target.
    pub compliant: usize,
    /// `round(compliant / measured * 100)`; 100 when nothing is measured.
    pub rate: u8,
}

/// Response/resolution compliance summary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SlaSummary {
    pub response: SlaMetric,
    pub resolution: SlaMetric,
    /// Mean minutes to first action over measured items, one decimal.
    pub avg_response_minutes: f64,
    /// Mean hours to resolution over measured items, one decimal.
    pub avg_resolution_hours: f64,
}

/// Business/after-hours creation cohorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BusinessHourStats {
    pub business: usize,
    pub after_hours: usize,
}

/// Calendar-day creation windows anchored at the report's `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecentTrends {
    pub today: usize,
    pub yesterday: usize,
    pub week: usize,
}

/// One entry in the needs-attention list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityItem {
    pub id: String,
    pub level: u8,
    pub status: Status,
    pub item_type: String,
    pub needs_escalation: bool,
    /// Human-readable time since creation, e.g. `2d 4h`.
    pub age: String,
}

/// Diagnostic record for one skipped snapshot row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub id: String,
    pub reason: &'static str,
}

/// Output of one aggregation pass over a snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateReport {
    /// Snapshot length, including skipped rows.
    pub total_items: usize,
    pub level_distribution: HashMap<String, usize>,
    pub status_distribution: HashMap<String, usize>,
    pub type_distribution: HashMap<String, usize>,
    pub sla: SlaSummary,
    pub business_hours: BusinessHourStats,
    pub trends: RecentTrends,
    /// First `priority_limit` escalation-eligible pending items, in snapshot
    /// order (not resorted by severity).
    pub priority_items: Vec<PriorityItem>,
    pub skipped_count: usize,
    pub skipped: Vec<SkippedItem>,
    /// True when the pass stopped at its budget; the report then covers a
    /// prefix of the snapshot and must not be presented as complete.
    pub truncated: bool,
}

/// Streams a snapshot through the classifier and policy catalog.
#[derive(Debug, Clone)]
pub struct Aggregator<K = DefaultKeys> {
    catalog: PolicyCatalog,
    hours: BusinessHours,
    options: AggregateOptions,
    keys: K,
}

impl Aggregator<DefaultKeys> {
    /// Aggregator with the default bucket-key labels.
    #[must_use]
    pub const fn new(
        catalog: PolicyCatalog,
        hours: BusinessHours,
        options: AggregateOptions,
    ) -> Self {
        Self {
            catalog,
            hours,
            options,
            keys: DefaultKeys,
        }
    }
}

impl<K: KeyStrategy> Aggregator<K> {
    /// Aggregator with a custom bucket-key strategy.
    #[must_use]
    pub const fn with_keys(
        catalog: PolicyCatalog,
        hours: BusinessHours,
        options: AggregateOptions,
        keys: K,
    ) -> Self {
        Self {
            catalog,
            hours,
            options,
            keys,
        }
    }

    /// Run one pass over `items`, anchored at `now`.
    #[must_use]
    pub fn aggregate(&self, items: &[WorkItem], now: DateTime<Utc>) -> AggregateReport {
        let started = Instant::now();
        let windows = TrendWindows::anchored(&self.hours, now);

        let mut report = AggregateReport {
            total_items: items.len(),
            ..AggregateReport::default()
        };
        let mut response_minutes_sum: i64 = 0;
        let mut resolution_minutes_sum: i64 = 0;

        for (index, item) in items.iter().enumerate() {
            if let Some(budget) = self.options.budget {
                if index > 0 && index % BUDGET_CHECK_INTERVAL == 0 && started.elapsed() > budget {
                    report.truncated = true;
                    debug!(
                        processed = index,
                        total = items.len(),
                        "aggregation budget exhausted; returning partial report"
                    );
                    break;
                }
            }

            let Some(created_at) = item.created_at else {
                debug!(id = %item.id, "snapshot row has no created_at; skipping");
                report.skipped.push(SkippedItem {
                    id: item.id.clone(),
                    reason: "missing created_at",
                });
                continue;
            };

            let keys = self.keys.keys(item);
            *report.level_distribution.entry(keys.level).or_insert(0) += 1;
            *report.status_distribution.entry(keys.status).or_insert(0) += 1;
            *report.type_distribution.entry(keys.item_type).or_insert(0) += 1;

            if classify::is_business_hour(&self.hours, created_at) {
                report.business_hours.business += 1;
            } else {
                report.business_hours.after_hours += 1;
            }

            windows.count(created_at, &mut report.trends);

            let policy = self.catalog.resolve(item.level);

            if let Some(first_action_at) = item.first_action_at {
                let minutes = (first_action_at - created_at).num_minutes();
                report.sla.response.measured += 1;
                response_minutes_sum += minutes.max(0);
                if minutes <= i64::from(policy.response_target_minutes) {
                    report.sla.response.compliant += 1;
                }
            }

            if let Some(resolved_at) = item.resolved_at {
                let minutes = (resolved_at - created_at).num_minutes();
                report.sla.resolution.measured += 1;
                resolution_minutes_sum += minutes.max(0);
                if minutes <= i64::from(policy.resolution_target_hours) * 60 {
                    report.sla.resolution.compliant += 1;
                }
            }

            let needs_escalation =
                policy.escalation_eligible && item.status == Status::Pending;
            if needs_escalation && report.priority_items.len() < self.options.priority_limit {
                report.priority_items.push(PriorityItem {
                    id: item.id.clone(),
                    level: item.level,
                    status: item.status,
                    item_type: item.type_bucket().to_string(),
                    needs_escalation,
                    age: format_age(now - created_at),
                });
            }
        }

        report.skipped_count = report.skipped.len();
        report.sla.response.rate = rate(report.sla.response.compliant, report.sla.response.measured);
        report.sla.resolution.rate =
            rate(report.sla.resolution.compliant, report.sla.resolution.measured);
        report.sla.avg_response_minutes =
            mean_one_decimal(response_minutes_sum, report.sla.response.measured, 1.0);
        report.sla.avg_resolution_hours =
            mean_one_decimal(resolution_minutes_sum, report.sla.resolution.measured, 60.0);

        report
    }
}

/// Day-anchored creation windows in the configured local offset.
///
/// `today` starts at local midnight, `yesterday` is the prior calendar day,
/// and `week` reaches back seven calendar days from today's start — anchored
/// at day granularity so the windows never shift within a day.
#[derive(Debug, Clone, Copy)]
struct TrendWindows {
    offset_minutes: i64,
    today_start: NaiveDateTime,
    yesterday_start: NaiveDateTime,
    week_start: NaiveDateTime,
}

impl TrendWindows {
    fn anchored(hours: &BusinessHours, now: DateTime<Utc>) -> Self {
        let offset_minutes = i64::from(hours.utc_offset_minutes);
        let local_now = (now + TimeDelta::minutes(offset_minutes)).naive_utc();
        let today_start = local_now.date().and_time(NaiveTime::MIN);

        Self {
            offset_minutes,
            today_start,
            yesterday_start: today_start - TimeDelta::days(1),
            week_start: today_start - TimeDelta::days(7),
        }
    }

    fn count(&self, created_at: DateTime<Utc>, trends: &mut RecentTrends) {
        let local = (created_at + TimeDelta::minutes(self.offset_minutes)).naive_utc();

        if local >= self.today_start {
            trends.today += 1;
        } else if local >= self.yesterday_start {
            trends.yesterday += 1;
        }

        if local >= self.week_start {
            trends.week += 1;
        }
    }
}

/// Integer percentage, rounded; 100 when nothing was measured (no failures
/// observed).
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn rate(compliant: usize, measured: usize) -> u8 {
    if measured == 0 {
        return 100;
    }

    ((compliant as f64 / measured as f64) * 100.0).round() as u8
}

/// Mean of `sum / count / divisor`, rounded to one decimal; 0.0 over nothing.
#[allow(clippy::cast_precision_loss)]
fn mean_one_decimal(sum: i64, count: usize, divisor: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }

    let mean = sum as f64 / count as f64 / divisor;
    (mean * 10.0).round() / 10.0
}

/// Human-readable elapsed time since creation, e.g. `4m`, `3h 24m`, `2d 4h`.
#[must_use]
pub fn format_age(elapsed: TimeDelta) -> String {
    let minutes = elapsed.num_minutes().max(0);

    if minutes >= 1_440 {
        let days = minutes / 1_440;
        let hours = (minutes % 1_440) / 60;
        format!("{days}d {hours}h")
    } else if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}
