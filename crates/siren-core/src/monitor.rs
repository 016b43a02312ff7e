//! Compliance monitoring: threshold checks over an [`AggregateReport`].
//!
//! Pure and stateless — no retry, no persistence. Callers decide what to do
//! with the warnings; the monitor only says which metrics breached.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::AggregateReport;

/// Minimum acceptable SLA compliance rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorThresholds {
    /// Response compliance below this percentage raises a warning.
    pub response_min_rate: u8,
    /// Resolution compliance below this percentage raises a warning.
    pub resolution_min_rate: u8,
}

impl Default for MonitorThresholds {
    fn default() -> Self {
        Self {
            response_min_rate: 90,
            resolution_min_rate: 85,
        }
    }
}

/// The SLA metric a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaMetricKind {
    Response,
    Resolution,
}

impl SlaMetricKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Resolution => "resolution",
        }
    }
}

impl fmt::Display for SlaMetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One breached threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceWarning {
    pub metric: SlaMetricKind,
    pub value: u8,
    pub threshold: u8,
}

/// Evaluate a report against thresholds.
///
/// Returns zero, one, or two warnings. A truncated report is still
/// evaluated; its `truncated` flag travels with the report so consumers can
/// qualify the numbers.
#[must_use]
pub fn evaluate(report: &AggregateReport, thresholds: &MonitorThresholds) -> Vec<ComplianceWarning> {
    let mut warnings = Vec::new();

    if report.sla.response.rate < thresholds.response_min_rate {
        warn!(
            rate = report.sla.response.rate,
            threshold = thresholds.response_min_rate,
            truncated = report.truncated,
            "response SLA compliance below threshold"
        );
        warnings.push(ComplianceWarning {
            metric: SlaMetricKind::Response,
            value: report.sla.response.rate,
            threshold: thresholds.response_min_rate,
        });
    }

    if report.sla.resolution.rate < thresholds.resolution_min_rate {
        warn!(
            rate = report.sla.resolution.rate,
            threshold = thresholds.resolution_min_rate,
            truncated = report.truncated,
            "resolution SLA compliance below threshold"
        );
        warnings.push(ComplianceWarning {
            metric: SlaMetricKind::Resolution,
            value: report.sla.resolution.rate,
            threshold: thresholds.resolution_min_rate,
        });
    }

    warnings
}
