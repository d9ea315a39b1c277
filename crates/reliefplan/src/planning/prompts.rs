//! Prompt templates for the report stages and the advisor lookups. Every
//! prompt demands a single JSON object so responses stay machine-parsable.

use serde_json::{json, Value};

use super::normalizer::AllocationPackage;
use super::pipeline::PlanStage;
use crate::needs::FundingMetrics;

pub(crate) fn system_for(stage: PlanStage) -> &'static str {
    match stage {
        PlanStage::Propose => {
            "You are a humanitarian funding strategist. Respond with one JSON object only."
        }
        PlanStage::Refine => {
            "You are a field operations planner localizing aid programmes. \
             Respond with one JSON object only."
        }
        PlanStage::Quantify => {
            "You are an impact assessor. Respond with one JSON object only."
        }
    }
}

pub(crate) const LOOKUP_SYSTEM: &str =
    "You are a humanitarian programme archivist. Respond with one JSON object only.";

pub(crate) const CLASSIFY_SYSTEM: &str =
    "You classify humanitarian crises. Respond with one JSON object only.";

pub(crate) fn propose_user(metrics: &FundingMetrics) -> String {
    format!(
        "Region {region} faces a {category} crisis in {year} with a funding gap of \
         {gap:.0} USD, {people} people in need, and a stability index of {stability:.2}.\n\
         Propose 3 to 4 aid solutions modeled on comparable historical programmes.\n\
         Return JSON: {{\"solutions\": [{{\"name\", \"analogous_region\", \
         \"allocation_pct\", \"success_likelihood\", \"projected_impact_count\", \
         \"rationale\"}}], \"summary\": string, \"reasoning\": string}}.\n\
         Allocation percentages should cover the whole gap.",
        region = metrics.region,
        category = metrics.category,
        year = metrics.year,
        gap = metrics.funding_gap,
        people = metrics.people_in_need,
        stability = metrics.stability_index,
    )
}

pub(crate) fn refine_user(metrics: &FundingMetrics, package: &AllocationPackage) -> String {
    let context = json!({ "metrics": metrics, "package": package });
    format!(
        "Given this normalized allocation package, describe localized implementation \
         adjustments (delivery partners, sequencing, access constraints) for each solution.\n\
         Return JSON: {{\"adjustments\": [{{\"solution\", \"notes\"}}]}}.\n{context}"
    )
}

pub(crate) fn quantify_user(metrics: &FundingMetrics, refined: &Value) -> String {
    let context = json!({ "metrics": metrics, "refined": refined });
    format!(
        "Estimate the overall impact of this plan on a 0-100 scale.\n\
         Return JSON: {{\"overall_impact_score\": number}}.\n{context}"
    )
}

pub(crate) fn lookup_user(region: &str, category: &str) -> String {
    format!(
        "Name one real region that faced a comparable {category} crisis to {region}, one real \
         historical aid programme that worked there, and a success likelihood from 0 to 100.\n\
         Return JSON: {{\"analogous_region\": string, \"solution\": string, \
         \"likelihood\": number}}."
    )
}

pub(crate) fn classify_user(region: &str) -> String {
    format!(
        "Classify the dominant humanitarian need in {region}. Answer with exactly one of \
         WASH, Health, Nutrition, Protection, Education.\n\
         Return JSON: {{\"category\": string}}."
    )
}
