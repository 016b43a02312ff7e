use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The five lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Assigned,
    InProgress,
    PendingVerify,
    Closed,
}

impl Status {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Assigned,
        Self::InProgress,
        Self::PendingVerify,
        Self::Closed,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingVerify => "pending_verify",
            Self::Closed => "closed",
        }
    }

    /// Returns true when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Allowed transition targets from this state.
    ///
    /// Valid transitions:
    /// - `pending -> assigned`
    /// - `pending -> closed` (short-circuit close)
    /// - `assigned -> in_progress`
    /// - `assigned -> closed`
    /// - `in_progress -> pending_verify`
    /// - `in_progress -> closed`
    /// - `pending_verify -> closed`
    /// - `pending_verify -> in_progress` (rework)
    #[must_use]
    pub const fn next_statuses(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Assigned, Self::Closed],
            Self::Assigned => &[Self::InProgress, Self::Closed],
            Self::InProgress => &[Self::PendingVerify, Self::Closed],
            Self::PendingVerify => &[Self::Closed, Self::InProgress],
            Self::Closed => &[],
        }
    }

    /// Returns true when `target` is reachable from this state in one step.
    #[must_use]
    pub fn can_transition(self, target: Self) -> bool {
        self.next_statuses().contains(&target)
    }

    /// Validate a transition from self to `target`.
    ///
    /// Self-transitions are not in the table and are rejected like any
    /// other illegal edge.
    pub fn ensure_transition(self, target: Self) -> Result<(), InvalidTransition> {
        if self == target {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }

        if self.can_transition(target) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
                reason: "transition not allowed by lifecycle rules",
            })
        }
    }
}

/// A ticket or alert tracked by the engine.
///
/// Snapshot rows arrive from an external storage collaborator, so every
/// field deserializes with a default; a row missing `created_at` is
/// malformed and is skipped (aggregation) or rejected (classifier, store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItem {
    pub id: String,
    /// Problem/alert type. Open vocabulary; `None` lands in the `"other"` bucket.
    pub item_type: Option<String>,
    /// Ordinal severity, resolved through the policy catalog.
    pub level: u8,
    pub status: Status,
    /// Set at creation, immutable.
    pub created_at: Option<DateTime<Utc>>,
    /// Stamped once by the first transition out of `pending`.
    pub first_action_at: Option<DateTime<Utc>>,
    /// Stamped once on transition into `closed`.
    pub resolved_at: Option<DateTime<Utc>>,
    pub assignee_id: Option<String>,
}

impl Default for WorkItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            item_type: None,
            level: 1,
            status: Status::Pending,
            created_at: None,
            first_action_at: None,
            resolved_at: None,
            assignee_id: None,
        }
    }
}

impl WorkItem {
    /// Create a new item in `pending`.
    #[must_use]
    pub fn new(id: impl Into<String>, level: u8, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            level,
            created_at: Some(created_at),
            ..Self::default()
        }
    }

    /// Set the item type.
    #[must_use]
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// Distribution bucket for the item type.
    #[must_use]
    pub fn type_bucket(&self) -> &str {
        self.item_type.as_deref().unwrap_or("other")
    }
}

/// Error returned when a status transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Status,
    pub to: Status,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid transition {} -> {}: {}",
            self.from, self.to, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "pending_verify" => Ok(Self::PendingVerify),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}
