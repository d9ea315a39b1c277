use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use reliefplan::needs::{MetricsOverrides, NeedsError, NeedsRecord, NeedsStore};
use reliefplan::planning::{PlanError, ReportPlanner};
use reliefplan::reasoning::{ReasoningClient, ReasoningError};

/// Replays a fixed sequence of reasoning responses and records every exchange.
#[derive(Default)]
struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Value, ReasoningError>>>,
    exchanges: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    fn with_responses(responses: Vec<Result<Value, ReasoningError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            exchanges: Mutex::new(Vec::new()),
        })
    }

    fn exchanges(&self) -> Vec<(String, String)> {
        self.exchanges.lock().expect("exchange lock").clone()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, ReasoningError> {
        self.exchanges
            .lock()
            .expect("exchange lock")
            .push((system_prompt.to_string(), user_prompt.to_string()));
        self.responses
            .lock()
            .expect("response lock")
            .pop_front()
            .unwrap_or_else(|| Err(ReasoningError::Upstream("script exhausted".to_string())))
    }
}

fn yemen_store() -> Arc<NeedsStore> {
    Arc::new(NeedsStore::from_records(vec![NeedsRecord {
        region: "Yemen".to_string(),
        year: 2026,
        crisis_category: "Nutrition".to_string(),
        funding_required: 3_700_000_000.0,
        funding_received: 820_000_000.0,
        people_in_need: 21_600_000,
        stability_index: 0.85,
    }]))
}

fn proposal_response() -> Value {
    json!({
        "solutions": [
            {
                "name": "Cash transfer scale-up",
                "analogous_region": "Somalia 2011",
                "allocation_pct": 60,
                "success_likelihood": "70%",
                "projected_impact_count": 1_200_000,
                "rationale": "Cash moved fastest during the Somalia famine response."
            },
            {
                "name": "Mobile nutrition clinics",
                "analogous_region": "South Sudan 2017",
                "allocation_pct": 20,
                "success_likelihood": 50,
                "projected_impact_count": 450_000,
                "rationale": "Clinics reached districts cut off from ports."
            }
        ],
        "summary": "Severe nutrition shortfall concentrated in the northwest.",
        "reasoning": "Comparable famine responses favored cash plus mobile outreach."
    })
}

#[tokio::test]
async fn pipeline_normalizes_and_assembles_report() {
    let client = ScriptedClient::with_responses(vec![
        Ok(proposal_response()),
        Ok(json!({ "adjustments": [{ "solution": "Cash transfer scale-up", "notes": "route via Aden" }] })),
        Ok(json!({ "overall_impact_score": 81.5 })),
    ]);
    let planner = ReportPlanner::new(yemen_store(), client.clone());

    let report = planner
        .generate_report("Yemen", Some(2026), &MetricsOverrides::default())
        .await
        .expect("report builds");

    assert_eq!(report.funding_gap, 2_880_000_000.0);
    assert!((report.underfunding_pct - 77.84).abs() < 0.01);

    // Allocations 60/20 renormalize to 75/25 and carve up the gap.
    assert_eq!(report.solutions[0].allocation_pct, 75.0);
    assert_eq!(report.solutions[1].allocation_pct, 25.0);
    assert_eq!(report.solutions[0].allocated_amount, 2_160_000_000.0);
    assert_eq!(report.solutions[1].allocated_amount, 720_000_000.0);
    assert_eq!(report.solutions[0].success_likelihood, "70.0%");
    assert_eq!(report.solutions[1].success_likelihood, "50.0%");

    assert_eq!(report.overall_impact_score, 81.5);
    assert_eq!(
        report.summary,
        "Severe nutrition shortfall concentrated in the northwest."
    );
    assert!(!report.reasoning.is_empty());
}

#[tokio::test]
async fn stages_run_in_order_with_typed_handoffs() {
    let client = ScriptedClient::with_responses(vec![
        Ok(proposal_response()),
        Ok(json!({ "adjustments": [] })),
        Ok(json!({ "overall_impact_score": 70 })),
    ]);
    let planner = ReportPlanner::new(yemen_store(), client.clone());

    planner
        .generate_report("Yemen", Some(2026), &MetricsOverrides::default())
        .await
        .expect("report builds");

    let exchanges = client.exchanges();
    assert_eq!(exchanges.len(), 3);

    // Propose embeds the metrics.
    assert!(exchanges[0].1.contains("Yemen"));
    assert!(exchanges[0].1.contains("2880000000"));
    assert!(exchanges[0].1.contains("21600000"));

    // Refine receives the normalized package, not the raw proposal.
    assert!(exchanges[1].1.contains("\"allocation_pct\":75.0"));

    // Quantify receives the refined output and asks for a single score.
    assert!(exchanges[2].1.contains("overall_impact_score"));
    assert!(exchanges[2].1.contains("adjustments"));
}

#[tokio::test]
async fn non_numeric_impact_score_falls_back_to_package_score() {
    let client = ScriptedClient::with_responses(vec![
        Ok(proposal_response()),
        Ok(json!({ "adjustments": [] })),
        Ok(json!({ "overall_impact_score": "unknown" })),
    ]);
    let planner = ReportPlanner::new(yemen_store(), client);

    let report = planner
        .generate_report("Yemen", Some(2026), &MetricsOverrides::default())
        .await
        .expect("report builds");

    // weights 0.75/0.25 over 70/50 => 65, damped by stability 0.85.
    assert_eq!(report.overall_impact_score, 55.25);
}

#[tokio::test]
async fn impact_score_is_clamped() {
    let client = ScriptedClient::with_responses(vec![
        Ok(proposal_response()),
        Ok(json!({ "adjustments": [] })),
        Ok(json!({ "overall_impact_score": 240 })),
    ]);
    let planner = ReportPlanner::new(yemen_store(), client);

    let report = planner
        .generate_report("Yemen", Some(2026), &MetricsOverrides::default())
        .await
        .expect("report builds");

    assert_eq!(report.overall_impact_score, 100.0);
}

#[tokio::test]
async fn stage_failure_aborts_the_run() {
    let client = ScriptedClient::with_responses(vec![
        Ok(proposal_response()),
        Err(ReasoningError::Malformed("prose instead of JSON".to_string())),
    ]);
    let planner = ReportPlanner::new(yemen_store(), client.clone());

    let error = planner
        .generate_report("Yemen", Some(2026), &MetricsOverrides::default())
        .await
        .expect_err("refine failure is fatal");

    assert!(matches!(
        error,
        PlanError::Reasoning(ReasoningError::Malformed(_))
    ));
    // The quantify stage never ran.
    assert_eq!(client.exchanges().len(), 2);
}

#[tokio::test]
async fn unknown_region_fails_before_any_reasoning_call() {
    let client = ScriptedClient::with_responses(vec![]);
    let planner = ReportPlanner::new(yemen_store(), client.clone());

    let error = planner
        .generate_report("Atlantis", None, &MetricsOverrides::default())
        .await
        .expect_err("region is unknown");

    assert!(matches!(
        error,
        PlanError::Needs(NeedsError::UnknownRegion(_))
    ));
    assert!(client.exchanges().is_empty());
}

#[tokio::test]
async fn overrides_reshape_the_prompt_inputs() {
    let client = ScriptedClient::with_responses(vec![
        Ok(json!({ "solutions": [], "summary": "", "reasoning": "" })),
        Ok(json!({})),
        Ok(json!({ "overall_impact_score": 10 })),
    ]);
    let planner = ReportPlanner::new(yemen_store(), client.clone());

    let overrides = MetricsOverrides {
        category: Some("Health".to_string()),
        funding_gap: Some(1_000_000.0),
        people_in_need: None,
        stability_index: Some(9.0),
    };
    let report = planner
        .generate_report("Yemen", Some(2026), &overrides)
        .await
        .expect("report builds");

    assert_eq!(report.category, "Health");
    assert_eq!(report.funding_gap, 1_000_000.0);
    assert_eq!(report.stability_index, 1.2);

    let exchanges = client.exchanges();
    assert!(exchanges[0].1.contains("Health"));
    assert!(exchanges[0].1.contains("1000000"));
}
