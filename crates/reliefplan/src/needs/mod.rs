use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One row of the humanitarian needs table. One record per (region, year);
/// immutable once the store is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedsRecord {
    pub region: String,
    pub year: i32,
    pub crisis_category: String,
    pub funding_required: f64,
    pub funding_received: f64,
    pub people_in_need: u64,
    pub stability_index: f64,
}

/// Funding-gap metrics derived from a needs record for a single request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingMetrics {
    pub region: String,
    pub year: i32,
    pub category: String,
    pub funding_gap: f64,
    pub underfunding_pct: f64,
    pub people_in_need: u64,
    pub stability_index: f64,
}

impl FundingMetrics {
    fn from_record(record: &NeedsRecord) -> Self {
        let funding_gap = (record.funding_required - record.funding_received).max(0.0);
        let underfunding_pct = if record.funding_required > 0.0 {
            funding_gap / record.funding_required * 100.0
        } else {
            0.0
        };

        Self {
            region: record.region.clone(),
            year: record.year,
            category: record.crisis_category.clone(),
            funding_gap,
            underfunding_pct,
            people_in_need: record.people_in_need,
            stability_index: record.stability_index,
        }
    }
}

/// Caller-supplied replacements applied after extraction. Values are clamped
/// so a planning run can never start from impossible inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsOverrides {
    pub category: Option<String>,
    pub funding_gap: Option<f64>,
    pub people_in_need: Option<i64>,
    pub stability_index: Option<f64>,
}

impl MetricsOverrides {
    pub fn apply(&self, metrics: &mut FundingMetrics) {
        if let Some(category) = &self.category {
            metrics.category = category.clone();
        }
        if let Some(funding_gap) = self.funding_gap {
            metrics.funding_gap = funding_gap.max(0.0);
        }
        if let Some(people_in_need) = self.people_in_need {
            metrics.people_in_need = people_in_need.max(0) as u64;
        }
        if let Some(stability_index) = self.stability_index {
            metrics.stability_index = stability_index.clamp(0.3, 1.2);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NeedsError {
    #[error("no needs record for region '{0}'")]
    UnknownRegion(String),
    #[error("failed to read needs data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid needs CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// In-memory table of needs records, loaded once at startup.
#[derive(Debug, Default)]
pub struct NeedsStore {
    records: Vec<NeedsRecord>,
}

impl NeedsStore {
    pub fn from_records(records: Vec<NeedsRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, NeedsError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for record in csv_reader.deserialize::<NeedsRecord>() {
            records.push(record?);
        }

        Ok(Self { records })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, NeedsError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Derives funding-gap metrics for a region. An exact (region, year) match
    /// wins; otherwise the first record for the region alone is used.
    pub fn metrics(&self, region: &str, year: Option<i32>) -> Result<FundingMetrics, NeedsError> {
        let region_matches = |record: &&NeedsRecord| record.region.eq_ignore_ascii_case(region);

        let record = year
            .and_then(|wanted| {
                self.records
                    .iter()
                    .find(|record| region_matches(record) && record.year == wanted)
            })
            .or_else(|| self.records.iter().find(region_matches))
            .ok_or_else(|| NeedsError::UnknownRegion(region.to_string()))?;

        Ok(FundingMetrics::from_record(record))
    }
}
