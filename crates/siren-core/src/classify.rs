//! Per-item classification: business-hours membership, escalation need, and
//! distribution bucket keys.
//!
//! Everything here is a pure function of one item plus configuration, so the
//! classifier is safely shared across concurrent aggregation passes.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeDelta, Timelike, Utc, Weekday};
use serde::Serialize;

use crate::config::BusinessHours;
use crate::error::EngineError;
use crate::model::item::{Status, WorkItem};
use crate::policy::PolicyCatalog;

/// The (level, status, type) label triple used for distribution counting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketKeys {
    pub level: String,
    pub status: String,
    pub item_type: String,
}

/// Classification of a single item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Whether the item was created inside the business window.
    pub business_hour: bool,
    pub needs_escalation: bool,
    pub keys: BucketKeys,
}

/// Shift a UTC timestamp into the configured local offset.
pub(crate) fn to_local(hours: &BusinessHours, at: DateTime<Utc>) -> NaiveDateTime {
    (at + TimeDelta::minutes(i64::from(hours.utc_offset_minutes))).naive_utc()
}

/// True when `at` falls inside the configured business window.
///
/// The hour window is half-open: `start_hour` is inside, `end_hour` is the
/// first hour outside.
#[must_use]
pub fn is_business_hour(hours: &BusinessHours, at: DateTime<Utc>) -> bool {
    let local = to_local(hours, at);

    if hours.weekdays_only && matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let hour = u8::try_from(local.hour()).unwrap_or(u8::MAX);
    hours.start_hour <= hour && hour < hours.end_hour
}

/// True iff the item's tier is escalation-eligible and it is still
/// unaddressed (`pending`).
///
/// A function of level and status only — SLA compliance is tracked
/// separately and the two signals are never merged.
#[must_use]
pub fn needs_escalation(catalog: &PolicyCatalog, item: &WorkItem) -> bool {
    item.status == Status::Pending && catalog.escalation_eligible(item.level)
}

/// Bucket labels for distribution counting.
#[must_use]
pub fn bucket_keys(item: &WorkItem) -> BucketKeys {
    BucketKeys {
        level: item.level.to_string(),
        status: item.status.to_string(),
        item_type: item.type_bucket().to_string(),
    }
}

/// Classify one item.
///
/// This is the strict single-item path: a missing `created_at` is an error
/// here, unlike aggregation, which skips the row and keeps going.
pub fn classify(
    catalog: &PolicyCatalog,
    hours: &BusinessHours,
    item: &WorkItem,
) -> Result<Classification, EngineError> {
    let Some(created_at) = item.created_at else {
        return Err(EngineError::MissingRequiredField {
            id: item.id.clone(),
            field: "created_at",
        });
    };

    Ok(Classification {
        business_hour: is_business_hour(hours, created_at),
        needs_escalation: needs_escalation(catalog, item),
        keys: bucket_keys(item),
    })
}
