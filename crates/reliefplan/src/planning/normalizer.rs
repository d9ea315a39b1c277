//! Deterministic repair of a proposed solution set.
//!
//! This is the only place global consistency is enforced: allocations are
//! renormalized to sum to 100%, unstated amounts are carved out of the funding
//! gap, and the package score is damped by the regional stability index.

use serde::Serialize;

use super::proposal::SolutionDraft;
use crate::needs::FundingMetrics;

/// A solution after repair. Within one package, `allocation_pct` values sum
/// to 100 (up to rounding) for any non-empty input set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSolution {
    pub name: String,
    pub analogous_region: String,
    pub allocation_pct: f64,
    pub allocated_amount: f64,
    pub success_likelihood: String,
    pub projected_impact_count: u64,
    pub rationale: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AllocationPackage {
    pub solutions: Vec<NormalizedSolution>,
    pub package_success_score: f64,
}

/// Repairs and scores a draft solution set. Pure; no external calls.
pub fn allocate(metrics: &FundingMetrics, drafts: &[SolutionDraft]) -> AllocationPackage {
    if drafts.is_empty() {
        return AllocationPackage::default();
    }

    let total: f64 = drafts.iter().map(|draft| draft.allocation_pct).sum();
    let equal_weight = 1.0 / drafts.len() as f64;

    let mut weighted_success = 0.0;
    let mut solutions = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let weight = if total <= 0.0 {
            equal_weight
        } else {
            draft.allocation_pct / total
        };
        weighted_success += weight * draft.success_pct;

        let amount = draft
            .explicit_amount
            .unwrap_or(metrics.funding_gap * weight);

        solutions.push(NormalizedSolution {
            name: draft.name.clone(),
            analogous_region: draft.analogous_region.clone(),
            allocation_pct: round2(weight * 100.0),
            allocated_amount: round2(amount),
            success_likelihood: format!("{:.1}%", draft.success_pct),
            projected_impact_count: draft.projected_impact_count,
            rationale: draft.rationale.clone(),
        });
    }

    AllocationPackage {
        solutions,
        package_success_score: round2(
            (weighted_success * metrics.stability_index).clamp(0.0, 100.0),
        ),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
