//! Three-stage report pipeline: propose, refine, quantify, with the local
//! normalizer between the first two stages. Stages run strictly in order and
//! any failure aborts the whole run; no partial report is ever returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::normalizer::{self, NormalizedSolution};
use super::prompts;
use super::proposal;
use crate::needs::{FundingMetrics, MetricsOverrides, NeedsError, NeedsStore};
use crate::reasoning::{ReasoningClient, ReasoningError};

/// Ordered reasoning stages of one report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStage {
    Propose,
    Refine,
    Quantify,
}

impl PlanStage {
    pub fn label(self) -> &'static str {
        match self {
            PlanStage::Propose => "propose",
            PlanStage::Refine => "refine",
            PlanStage::Quantify => "quantify",
        }
    }
}

/// Errors fatal to a report run.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Needs(#[from] NeedsError),
    #[error(transparent)]
    Reasoning(#[from] ReasoningError),
}

/// The assembled aid-allocation plan for one region. Built once per run; not
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub region: String,
    pub year: i32,
    pub category: String,
    pub funding_gap: f64,
    pub underfunding_pct: f64,
    pub people_in_need: u64,
    pub stability_index: f64,
    pub solutions: Vec<NormalizedSolution>,
    pub overall_impact_score: f64,
    pub summary: String,
    pub reasoning: String,
    pub generated_at: DateTime<Utc>,
}

/// Drives the reasoning service through the stage sequence for one region.
pub struct ReportPlanner<C> {
    store: Arc<NeedsStore>,
    client: C,
}

impl<C> ReportPlanner<C>
where
    C: ReasoningClient,
{
    pub fn new(store: Arc<NeedsStore>, client: C) -> Self {
        Self { store, client }
    }

    /// Boundary-facing metrics lookup without any reasoning calls.
    pub fn metrics(&self, region: &str, year: Option<i32>) -> Result<FundingMetrics, NeedsError> {
        self.store.metrics(region, year)
    }

    pub async fn generate_report(
        &self,
        region: &str,
        year: Option<i32>,
        overrides: &MetricsOverrides,
    ) -> Result<Report, PlanError> {
        let mut metrics = self.store.metrics(region, year)?;
        overrides.apply(&mut metrics);

        let raw_proposal = self
            .run_stage(PlanStage::Propose, &prompts::propose_user(&metrics))
            .await?;
        let (drafts, narrative) = proposal::parse_proposal(&raw_proposal);

        // The normalized package is the canonical solution set; later stages
        // only annotate it and must never rewrite the allocations.
        let package = normalizer::allocate(&metrics, &drafts);
        info!(
            region = %metrics.region,
            solutions = package.solutions.len(),
            package_score = package.package_success_score,
            "normalized proposal package"
        );

        let refined = self
            .run_stage(
                PlanStage::Refine,
                &prompts::refine_user(&metrics, &package),
            )
            .await?;

        let quantified = self
            .run_stage(
                PlanStage::Quantify,
                &prompts::quantify_user(&metrics, &refined),
            )
            .await?;

        let overall_impact_score = proposal::percent_opt(quantified.get("overall_impact_score"))
            .unwrap_or(package.package_success_score)
            .clamp(0.0, 100.0);

        Ok(Report {
            region: metrics.region,
            year: metrics.year,
            category: metrics.category,
            funding_gap: metrics.funding_gap,
            underfunding_pct: metrics.underfunding_pct,
            people_in_need: metrics.people_in_need,
            stability_index: metrics.stability_index,
            solutions: package.solutions,
            overall_impact_score,
            summary: narrative.summary,
            reasoning: narrative.reasoning,
            generated_at: Utc::now(),
        })
    }

    async fn run_stage(
        &self,
        stage: PlanStage,
        user_prompt: &str,
    ) -> Result<Value, ReasoningError> {
        debug!(stage = stage.label(), "dispatching reasoning stage");
        self.client.ask(prompts::system_for(stage), user_prompt).await
    }
}
