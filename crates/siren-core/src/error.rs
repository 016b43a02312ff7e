use std::fmt;

use crate::model::item::{InvalidTransition, Status};

/// Machine-readable error codes for operator- and agent-friendly output.
///
/// Codes are stable: dashboards and log pipelines grep for them, so a code
/// is never renumbered once shipped. Not every code maps to an
/// [`EngineError`] variant — `UnknownPolicyTier` is a logged fallback and
/// `AggregationTruncated` is a report flag, but both get stable codes so
/// they can be correlated across logs and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    ItemNotFound,
    InvalidStateTransition,
    StatusConflict,
    DuplicateItem,
    MissingRequiredField,
    UnknownPolicyTier,
    AggregationTruncated,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::ItemNotFound => "E2001",
            Self::InvalidStateTransition => "E2002",
            Self::StatusConflict => "E2003",
            Self::DuplicateItem => "E2004",
            Self::MissingRequiredField => "E2005",
            Self::UnknownPolicyTier => "E3001",
            Self::AggregationTruncated => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Item not found",
            Self::InvalidStateTransition => "Invalid status transition",
            Self::StatusConflict => "Item status changed concurrently",
            Self::DuplicateItem => "Item already registered",
            Self::MissingRequiredField => "Item is missing a required field",
            Self::UnknownPolicyTier => "Severity level outside the policy catalog",
            Self::AggregationTruncated => "Aggregation stopped at its time budget",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in siren.toml and retry."),
            Self::ItemNotFound => None,
            Self::InvalidStateTransition => Some(
                "Follow valid transitions: pending -> assigned -> in_progress -> pending_verify -> closed.",
            ),
            Self::StatusConflict => Some("Re-read the item and retry with its current status."),
            Self::DuplicateItem => Some("Use a fresh id, or transition the existing item."),
            Self::MissingRequiredField => {
                Some("Repair the snapshot row upstream; created_at is set at creation.")
            }
            Self::UnknownPolicyTier => {
                Some("Declare the level in [policy] or widen min_level/max_level.")
            }
            Self::AggregationTruncated => {
                Some("Raise the report budget or narrow the snapshot scope.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Typed errors returned at the engine API boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Requested status change is not in the legal-transition table.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The caller's expected status is stale; the item moved concurrently.
    #[error("item '{id}' is {actual}, not {expected}; refusing stale transition")]
    StatusConflict {
        id: String,
        expected: Status,
        actual: Status,
    },

    /// No item registered under this id.
    #[error("item '{id}' not found")]
    ItemNotFound { id: String },

    /// An item with this id is already registered.
    #[error("item '{id}' already exists")]
    DuplicateItem { id: String },

    /// A field required for this computation is absent.
    #[error("item '{id}' is missing required field '{field}'")]
    MissingRequiredField { id: String, field: &'static str },
}

impl EngineError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidTransition(_) => ErrorCode::InvalidStateTransition,
            Self::StatusConflict { .. } => ErrorCode::StatusConflict,
            Self::ItemNotFound { .. } => ErrorCode::ItemNotFound,
            Self::DuplicateItem { .. } => ErrorCode::DuplicateItem,
            Self::MissingRequiredField { .. } => ErrorCode::MissingRequiredField,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineError, ErrorCode};
    use crate::model::item::Status;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::ItemNotFound,
            ErrorCode::InvalidStateTransition,
            ErrorCode::StatusConflict,
            ErrorCode::DuplicateItem,
            ErrorCode::MissingRequiredField,
            ErrorCode::UnknownPolicyTier,
            ErrorCode::AggregationTruncated,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidStateTransition.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn engine_errors_map_to_codes() {
        let conflict = EngineError::StatusConflict {
            id: "tk-1".to_string(),
            expected: Status::Pending,
            actual: Status::Assigned,
        };
        assert_eq!(conflict.code(), ErrorCode::StatusConflict);
        assert!(conflict.to_string().contains("tk-1"));
        assert!(conflict.to_string().contains("assigned"));

        let invalid: EngineError = Status::Closed
            .ensure_transition(Status::Pending)
            .expect_err("closed is terminal")
            .into();
        assert_eq!(invalid.code(), ErrorCode::InvalidStateTransition);
    }
}
