//! SLA policy catalog: severity tier -> response/resolution targets.
//!
//! Lookups are pure and total. A level without an explicit tier resolves to
//! the default tier; a level outside the declared range also resolves to the
//! default tier but is logged, since it usually means upstream data drift.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Response/resolution targets and escalation eligibility for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaPolicy {
    /// Minutes allowed between creation and first action.
    pub response_target_minutes: u32,
    /// Hours allowed between creation and resolution.
    pub resolution_target_hours: u32,
    /// Whether unaddressed items at this tier qualify for escalation.
    pub escalation_eligible: bool,
}

impl SlaPolicy {
    /// The fallback tier applied to every level without an explicit entry.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            response_target_minutes: 120,
            resolution_target_hours: 24,
            escalation_eligible: false,
        }
    }
}

/// Mapping from severity level to SLA policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyCatalog {
    tiers: BTreeMap<u8, SlaPolicy>,
    default_tier: SlaPolicy,
    min_level: u8,
    max_level: u8,
}

impl Default for PolicyCatalog {
    /// Reference defaults: level 5 responds in 5 minutes and resolves in an
    /// hour, level 4 in 30 minutes / 4 hours (both escalation-eligible);
    /// every other level takes the fallback tier.
    fn default() -> Self {
        let mut tiers = BTreeMap::new();
        tiers.insert(
            5,
            SlaPolicy {
                response_target_minutes: 5,
                resolution_target_hours: 1,
                escalation_eligible: true,
            },
        );
        tiers.insert(
            4,
            SlaPolicy {
                response_target_minutes: 30,
                resolution_target_hours: 4,
                escalation_eligible: true,
            },
        );

        Self {
            tiers,
            default_tier: SlaPolicy::fallback(),
            min_level: 1,
            max_level: 5,
        }
    }
}

impl PolicyCatalog {
    /// Build a catalog from explicit tiers, a default tier, and the declared
    /// valid level range.
    #[must_use]
    pub const fn new(
        tiers: BTreeMap<u8, SlaPolicy>,
        default_tier: SlaPolicy,
        min_level: u8,
        max_level: u8,
    ) -> Self {
        Self {
            tiers,
            default_tier,
            min_level,
            max_level,
        }
    }

    /// Resolve the policy for `level`.
    ///
    /// Never fails: levels without an explicit tier get the default tier, and
    /// levels outside the declared range additionally log a warning.
    #[must_use]
    pub fn resolve(&self, level: u8) -> SlaPolicy {
        if level < self.min_level || level > self.max_level {
            warn!(level, "severity level outside the policy catalog; using default tier");
        }
        self.tiers.get(&level).copied().unwrap_or(self.default_tier)
    }

    /// Shortcut for the eligibility flag of `level`'s tier.
    #[must_use]
    pub fn escalation_eligible(&self, level: u8) -> bool {
        self.resolve(level).escalation_eligible
    }

    /// Explicit tiers, ascending by level.
    pub fn tiers(&self) -> impl Iterator<Item = (u8, SlaPolicy)> + '_ {
        self.tiers.iter().map(|(level, policy)| (*level, *policy))
    }

    /// The tier applied to levels without an explicit entry.
    #[must_use]
    pub const fn default_tier(&self) -> SlaPolicy {
        self.default_tier
    }

    /// The declared `(min, max)` valid level range.
    #[must_use]
    pub const fn level_range(&self) -> (u8, u8) {
        (self.min_level, self.max_level)
    }
}
