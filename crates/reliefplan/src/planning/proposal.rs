//! Coercion of untrusted reasoning-service output into typed drafts.
//!
//! Upstream responses routinely carry percentages as strings, omit keys, or
//! use the wrong JSON type entirely. Everything defensive lives here so the
//! normalizer can stay a plain arithmetic routine over typed values.

use serde_json::Value;

/// One solution candidate after coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionDraft {
    pub name: String,
    pub analogous_region: String,
    pub allocation_pct: f64,
    pub success_pct: f64,
    pub explicit_amount: Option<f64>,
    pub projected_impact_count: u64,
    pub rationale: String,
}

/// Narrative fields carried from the proposal stage into the final report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalNarrative {
    pub summary: String,
    pub reasoning: String,
}

/// Splits a raw proposal response into solution drafts and narrative text.
/// Accepts either `{"solutions": [...]}` or a bare top-level array.
pub fn parse_proposal(raw: &Value) -> (Vec<SolutionDraft>, ProposalNarrative) {
    let drafts = raw
        .get("solutions")
        .and_then(Value::as_array)
        .or_else(|| raw.as_array())
        .map(|items| items.iter().map(draft_from_value).collect())
        .unwrap_or_default();

    let narrative = ProposalNarrative {
        summary: string_field(raw, "summary"),
        reasoning: string_field(raw, "reasoning"),
    };

    (drafts, narrative)
}

fn draft_from_value(value: &Value) -> SolutionDraft {
    SolutionDraft {
        name: string_field(value, "name"),
        analogous_region: string_field(value, "analogous_region"),
        allocation_pct: percent(value.get("allocation_pct")),
        success_pct: percent(value.get("success_likelihood")),
        explicit_amount: value
            .get("allocated_amount")
            .and_then(Value::as_f64)
            .filter(|amount| *amount > 0.0),
        projected_impact_count: non_negative_count(value.get("projected_impact_count")),
        rationale: string_field(value, "rationale"),
    }
}

/// Percent rule for untrusted fields: numbers pass through, strings may carry
/// a trailing `%`, anything else coerces to zero.
pub(crate) fn percent(value: Option<&Value>) -> f64 {
    percent_opt(value).unwrap_or(0.0)
}

/// Like [`percent`] but distinguishes "absent or non-numeric" from zero, for
/// callers with their own fallback (the quantify stage).
pub(crate) fn percent_opt(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn non_negative_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().map(|v| v.max(0.0) as u64))
            .unwrap_or(0),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map(|v| v.max(0.0) as u64)
            .unwrap_or(0),
        _ => 0,
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
