use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use reliefplan::config::{NeedsConfig, ReasoningConfig};
use reliefplan::error::AppError;
use reliefplan::needs::{NeedsRecord, NeedsStore};
use reliefplan::planning::{InMemorySolutionCache, ReportPlanner, SolutionAdvisor};
use reliefplan::reasoning::{HttpReasoningClient, ReasoningClient};
use tracing::info;

pub(crate) type SharedReasoning = Arc<dyn ReasoningClient>;

/// Server-level state for readiness and metrics endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Domain services shared by the planning endpoints.
#[derive(Clone)]
pub(crate) struct PlannerState {
    pub(crate) planner: Arc<ReportPlanner<SharedReasoning>>,
    pub(crate) advisor: Arc<SolutionAdvisor<SharedReasoning, InMemorySolutionCache>>,
}

impl PlannerState {
    pub(crate) fn new(store: Arc<NeedsStore>, client: SharedReasoning) -> Self {
        Self {
            planner: Arc::new(ReportPlanner::new(store, client.clone())),
            advisor: Arc::new(SolutionAdvisor::new(
                client,
                Arc::new(InMemorySolutionCache::default()),
            )),
        }
    }

    pub(crate) fn from_configs(
        needs: &NeedsConfig,
        reasoning: &ReasoningConfig,
    ) -> Result<Self, AppError> {
        let store = Arc::new(load_needs_store(needs)?);
        let client: SharedReasoning = Arc::new(HttpReasoningClient::from_config(reasoning));
        Ok(Self::new(store, client))
    }
}

fn load_needs_store(config: &NeedsConfig) -> Result<NeedsStore, AppError> {
    let store = match &config.data_path {
        Some(path) => {
            let store = NeedsStore::from_path(path)?;
            info!(path = %path.display(), records = store.len(), "loaded needs dataset");
            store
        }
        None => {
            let store = NeedsStore::from_records(sample_needs_records());
            info!(records = store.len(), "no needs dataset configured; using embedded sample");
            store
        }
    };
    Ok(store)
}

/// Embedded fallback dataset so the service can run without external data.
pub(crate) fn sample_needs_records() -> Vec<NeedsRecord> {
    vec![
        NeedsRecord {
            region: "Yemen".to_string(),
            year: 2026,
            crisis_category: "Nutrition".to_string(),
            funding_required: 3_700_000_000.0,
            funding_received: 820_000_000.0,
            people_in_need: 21_600_000,
            stability_index: 0.82,
        },
        NeedsRecord {
            region: "Sudan".to_string(),
            year: 2026,
            crisis_category: "Protection".to_string(),
            funding_required: 2_700_000_000.0,
            funding_received: 610_000_000.0,
            people_in_need: 24_800_000,
            stability_index: 0.55,
        },
        NeedsRecord {
            region: "Afghanistan".to_string(),
            year: 2026,
            crisis_category: "Health".to_string(),
            funding_required: 3_060_000_000.0,
            funding_received: 1_150_000_000.0,
            people_in_need: 23_700_000,
            stability_index: 0.68,
        },
        NeedsRecord {
            region: "Haiti".to_string(),
            year: 2026,
            crisis_category: "WASH".to_string(),
            funding_required: 674_000_000.0,
            funding_received: 292_000_000.0,
            people_in_need: 5_500_000,
            stability_index: 0.74,
        },
        NeedsRecord {
            region: "DR Congo".to_string(),
            year: 2026,
            crisis_category: "Protection".to_string(),
            funding_required: 2_570_000_000.0,
            funding_received: 980_000_000.0,
            people_in_need: 25_400_000,
            stability_index: 0.6,
        },
    ]
}
