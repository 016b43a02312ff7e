//! `sn policy` — resolved SLA policy for a level, or the whole catalog.

use clap::Args;
use serde::Serialize;
use siren_core::config::EngineConfig;
use siren_core::policy::SlaPolicy;

use crate::output::{OutputMode, render};

/// Arguments for `sn policy`.
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Severity level to resolve; shows the whole catalog when omitted.
    level: Option<u8>,
}

#[derive(Debug, Serialize)]
struct ResolvedPolicy {
    level: u8,
    #[serde(flatten)]
    policy: SlaPolicy,
}

#[derive(Debug, Serialize)]
struct CatalogPayload {
    min_level: u8,
    max_level: u8,
    tiers: Vec<ResolvedPolicy>,
    default_tier: SlaPolicy,
}

fn policy_line(policy: SlaPolicy) -> String {
    format!(
        "respond {}m, resolve {}h{}",
        policy.response_target_minutes,
        policy.resolution_target_hours,
        if policy.escalation_eligible {
            ", escalation-eligible"
        } else {
            ""
        }
    )
}

/// Execute `sn policy`.
pub fn run_policy(
    args: &PolicyArgs,
    output: OutputMode,
    config: &EngineConfig,
) -> anyhow::Result<()> {
    let catalog = config.catalog();

    if let Some(level) = args.level {
        let payload = ResolvedPolicy {
            level,
            policy: catalog.resolve(level),
        };
        return render(output, &payload, |payload, w| {
            writeln!(w, "level {}: {}", payload.level, policy_line(payload.policy))
        });
    }

    let (min_level, max_level) = catalog.level_range();
    let payload = CatalogPayload {
        min_level,
        max_level,
        tiers: catalog
            .tiers()
            .map(|(level, policy)| ResolvedPolicy { level, policy })
            .collect(),
        default_tier: catalog.default_tier(),
    };

    render(output, &payload, |payload, w| {
        writeln!(w, "Policy catalog (levels {}-{})", payload.min_level, payload.max_level)?;
        for tier in &payload.tiers {
            writeln!(w, "  level {}: {}", tier.level, policy_line(tier.policy))?;
        }
        writeln!(w, "  default: {}", policy_line(payload.default_tier))
    })
}
