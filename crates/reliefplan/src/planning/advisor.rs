//! Memoized, backoff-protected single-recommendation lookup, independent of
//! the report pipeline. Lookups never surface an error: every failure path
//! resolves to a cached degraded fallback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::prompts;
use super::proposal;
use crate::reasoning::{ReasoningClient, ReasoningError};

const MAX_LOOKUP_ATTEMPTS: u32 = 5;
const BACKOFF_BASE_SECS: u64 = 2;

/// A single cached recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub analogous_region: String,
    pub solution: String,
    pub likelihood: f64,
}

/// Injected cache seam so lookups can be isolated in tests or later backed by
/// a real store.
pub trait SolutionCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Recommendation>;
    fn put(&self, key: String, value: Recommendation);
}

/// Process-lifetime map with no eviction and no TTL. Degraded fallbacks are
/// cached under the same keys as genuine recommendations and are therefore
/// indistinguishable to later callers; see DESIGN.md before changing this.
#[derive(Debug, Default)]
pub struct InMemorySolutionCache {
    entries: Mutex<HashMap<String, Recommendation>>,
}

impl SolutionCache for InMemorySolutionCache {
    fn get(&self, key: &str) -> Option<Recommendation> {
        self.entries
            .lock()
            .expect("solution cache mutex poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: String, value: Recommendation) {
        self.entries
            .lock()
            .expect("solution cache mutex poisoned")
            .insert(key, value);
    }
}

/// Crisis categories the classifier may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrisisCategory {
    Wash,
    Health,
    Nutrition,
    Protection,
    Education,
}

impl CrisisCategory {
    pub const ALL: [CrisisCategory; 5] = [
        CrisisCategory::Wash,
        CrisisCategory::Health,
        CrisisCategory::Nutrition,
        CrisisCategory::Protection,
        CrisisCategory::Education,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CrisisCategory::Wash => "WASH",
            CrisisCategory::Health => "Health",
            CrisisCategory::Nutrition => "Nutrition",
            CrisisCategory::Protection => "Protection",
            CrisisCategory::Education => "Education",
        }
    }

    fn from_exact(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(text.trim()))
    }

    fn from_loose(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| lowered.contains(&category.label().to_lowercase()))
    }
}

/// Cache-and-retry wrapper around the narrow single-recommendation prompt.
pub struct SolutionAdvisor<C, S> {
    client: C,
    cache: Arc<S>,
}

impl<C, S> SolutionAdvisor<C, S>
where
    C: ReasoningClient,
    S: SolutionCache,
{
    pub fn new(client: C, cache: Arc<S>) -> Self {
        Self { client, cache }
    }

    /// Memoized lookup of one analogous-programme recommendation.
    ///
    /// Up to five attempts; rate-limited failures back off 2, 4, 8, 16 seconds
    /// between attempts and resolve to a degraded value (likelihood 65) when
    /// the limit persists. Any other failure resolves immediately to a
    /// degraded value (likelihood 60). The resolved value is always cached.
    pub async fn lookup(&self, region: &str, category: &str) -> Recommendation {
        let key = cache_key(region, category);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let user_prompt = prompts::lookup_user(region, category);
        let mut attempt = 0;

        let resolved = loop {
            match self.client.ask(prompts::LOOKUP_SYSTEM, &user_prompt).await {
                Ok(raw) => break recommendation_from_value(&raw),
                Err(ReasoningError::RateLimited(message)) => {
                    attempt += 1;
                    if attempt >= MAX_LOOKUP_ATTEMPTS {
                        warn!(
                            %region, %category,
                            "rate limiting persisted through retries; caching degraded fallback"
                        );
                        break degraded_rate_limited();
                    }
                    let delay =
                        Duration::from_secs(BACKOFF_BASE_SECS * 2u64.pow(attempt - 1));
                    info!(
                        %region, %category, attempt,
                        delay_secs = delay.as_secs(), %message,
                        "rate limited; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    warn!(%region, %category, %error, "lookup failed; caching degraded fallback");
                    break degraded_unavailable();
                }
            }
        };

        self.cache.put(key, resolved.clone());
        resolved
    }

    /// Single-call crisis classifier. Out-of-set answers fall back to a
    /// case-insensitive substring match; anything else defaults to Health.
    pub async fn classify(&self, region: &str) -> CrisisCategory {
        match self
            .client
            .ask(prompts::CLASSIFY_SYSTEM, &prompts::classify_user(region))
            .await
        {
            Ok(raw) => {
                let answer = raw
                    .get("category")
                    .and_then(Value::as_str)
                    .or_else(|| raw.as_str())
                    .unwrap_or_default();
                CrisisCategory::from_exact(answer)
                    .or_else(|| CrisisCategory::from_loose(answer))
                    .unwrap_or(CrisisCategory::Health)
            }
            Err(error) => {
                warn!(%region, %error, "category classification failed; defaulting to Health");
                CrisisCategory::Health
            }
        }
    }
}

fn cache_key(region: &str, category: &str) -> String {
    format!(
        "{}:{}",
        region.trim().to_lowercase(),
        category.trim().to_lowercase()
    )
}

fn recommendation_from_value(raw: &Value) -> Recommendation {
    Recommendation {
        analogous_region: raw
            .get("analogous_region")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        solution: raw
            .get("solution")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        likelihood: proposal::percent(raw.get("likelihood")).clamp(0.0, 100.0),
    }
}

fn degraded_rate_limited() -> Recommendation {
    Recommendation {
        analogous_region: "Regional programme archive".to_string(),
        solution: "Scale proven cash-based assistance through established local partners"
            .to_string(),
        likelihood: 65.0,
    }
}

fn degraded_unavailable() -> Recommendation {
    Recommendation {
        analogous_region: "Comparable crisis programmes".to_string(),
        solution: "Prioritize multi-sector cash assistance while the advisor is unavailable"
            .to_string(),
        likelihood: 60.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_keys_are_lowercased_and_trimmed() {
        assert_eq!(cache_key(" Yemen ", "NUTRITION"), "yemen:nutrition");
    }

    #[test]
    fn recommendation_coerces_percent_strings_and_clamps() {
        let raw = json!({
            "analogous_region": "Kerala 2018",
            "solution": "Flood cash relief",
            "likelihood": "72%"
        });
        assert_eq!(recommendation_from_value(&raw).likelihood, 72.0);

        let overflowing = json!({ "likelihood": 140 });
        let parsed = recommendation_from_value(&overflowing);
        assert_eq!(parsed.likelihood, 100.0);
        assert_eq!(parsed.analogous_region, "Unknown");
    }

    #[test]
    fn category_matching_is_exact_then_substring() {
        assert_eq!(
            CrisisCategory::from_exact("protection"),
            Some(CrisisCategory::Protection)
        );
        assert_eq!(CrisisCategory::from_exact("water issues"), None);
        assert_eq!(
            CrisisCategory::from_loose("mostly a WASH and sanitation emergency"),
            Some(CrisisCategory::Wash)
        );
        assert_eq!(CrisisCategory::from_loose("unclear"), None);
    }
}
