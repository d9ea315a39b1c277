mod http;

pub use http::HttpReasoningClient;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// Failure taxonomy for the reasoning service. Rate limiting is a first-class
/// tag so retry policies dispatch on the variant instead of sniffing error
/// text.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("reasoning service is not configured")]
    Unconfigured,
    #[error("reasoning service returned a response that is not valid JSON: {0}")]
    Malformed(String),
    #[error("reasoning service rate limited the request: {0}")]
    RateLimited(String),
    #[error("reasoning service request failed: {0}")]
    Upstream(String),
}

/// A single structured-output exchange with the reasoning service. No retry
/// happens at this layer.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, ReasoningError>;
}

#[async_trait]
impl<T: ReasoningClient + ?Sized> ReasoningClient for Arc<T> {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, ReasoningError> {
        (**self).ask(system_prompt, user_prompt).await
    }
}

/// Markers some upstream providers bury in error bodies instead of a 429
/// status. Matched case-insensitively when tagging transport failures.
const RATE_LIMIT_MARKERS: [&str; 4] = ["429", "rate", "too many requests", "quota"];

pub(crate) fn is_rate_limit_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
