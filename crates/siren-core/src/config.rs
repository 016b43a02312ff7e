//! Engine configuration: policy tiers, business-hours window, monitor
//! thresholds, and report options.
//!
//! Everything here is injectable so deployments tune SLA targets without a
//! rebuild. Resolution order: explicit path, then `./siren.toml`, then the
//! user config dir, then compiled defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::monitor::MonitorThresholds;
use crate::policy::{PolicyCatalog, SlaPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: PolicyConfig,
    pub hours: BusinessHours,
    pub monitor: MonitorThresholds,
    pub report: ReportConfig,
}

impl EngineConfig {
    /// Build the runtime policy catalog from the configured tiers.
    #[must_use]
    pub fn catalog(&self) -> PolicyCatalog {
        self.policy.to_catalog()
    }
}

/// One explicit severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    pub level: u8,
    pub response_target_minutes: u32,
    pub resolution_target_hours: u32,
    pub escalation_eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Declared valid level range; levels outside it are logged on lookup.
    pub min_level: u8,
    pub max_level: u8,
    pub default_tier: SlaPolicy,
    /// Explicit tiers; levels not listed take `default_tier`.
    pub tiers: Vec<TierConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: 5,
            default_tier: SlaPolicy::fallback(),
            tiers: vec![
                TierConfig {
                    level: 5,
                    response_target_minutes: 5,
                    resolution_target_hours: 1,
                    escalation_eligible: true,
                },
                TierConfig {
                    level: 4,
                    response_target_minutes: 30,
                    resolution_target_hours: 4,
                    escalation_eligible: true,
                },
            ],
        }
    }
}

impl PolicyConfig {
    /// Convert the config shape into the runtime catalog.
    #[must_use]
    pub fn to_catalog(&self) -> PolicyCatalog {
        let tiers = self
            .tiers
            .iter()
            .map(|tier| {
                (
                    tier.level,
                    SlaPolicy {
                        response_target_minutes: tier.response_target_minutes,
                        resolution_target_hours: tier.resolution_target_hours,
                        escalation_eligible: tier.escalation_eligible,
                    },
                )
            })
            .collect();

        PolicyCatalog::new(tiers, self.default_tier, self.min_level, self.max_level)
    }
}

/// Business-hours window used to split items into business/after-hours
/// cohorts.
///
/// The "local" clock is `utc_offset_minutes`, not the host timezone, so the
/// same snapshot produces the same report on every machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    /// Exclude Saturday and Sunday from the window.
    pub weekdays_only: bool,
    /// First hour inside the window (local, inclusive).
    pub start_hour: u8,
    /// First hour outside the window (local, exclusive).
    pub end_hour: u8,
    /// Offset applied to UTC timestamps before any calendar math.
    pub utc_offset_minutes: i16,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            weekdays_only: true,
            start_hour: 9,
            end_hour: 18,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Maximum entries in the priority list.
    pub priority_limit: usize,
    /// Soft wall-clock budget for one aggregation pass, in milliseconds.
    /// `None` means unbounded.
    pub budget_ms: Option<u64>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            priority_limit: 5,
            budget_ms: None,
        }
    }
}

/// Load a config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EngineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve configuration: explicit path, `./siren.toml`, user config dir,
/// compiled defaults — first hit wins.
///
/// An explicit path that does not exist is an error; the implicit locations
/// are optional.
pub fn resolve_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        anyhow::ensure!(path.exists(), "config file {} does not exist", path.display());
        return load_config(path);
    }

    let project = PathBuf::from("siren.toml");
    if project.exists() {
        return load_config(&project);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("siren/config.toml");
        if user.exists() {
            return load_config(&user);
        }
    }

    Ok(EngineConfig::default())
}
