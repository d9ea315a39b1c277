use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{is_rate_limit_message, ReasoningClient, ReasoningError};
use crate::config::ReasoningConfig;

/// Client for an OpenAI-compatible chat-completions endpoint, always run in
/// JSON mode at the configured low temperature.
pub struct HttpReasoningClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
}

impl HttpReasoningClient {
    pub fn from_config(config: &ReasoningConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl ReasoningClient for HttpReasoningClient {
    async fn ask(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, ReasoningError> {
        let api_key = self.api_key.as_deref().ok_or(ReasoningError::Unconfigured)?;
        let url = format!("{}/v1/chat/completions", self.base_url);

        let request = json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        debug!(model = %self.model, prompt_chars = user_prompt.len(), "dispatching reasoning request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| tag_transport_failure(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("{status}: {body}");
            if status.as_u16() == 429 || is_rate_limit_message(&body) {
                return Err(ReasoningError::RateLimited(message));
            }
            return Err(ReasoningError::Upstream(message));
        }

        let envelope: ChatCompletion = response
            .json()
            .await
            .map_err(|err| ReasoningError::Malformed(err.to_string()))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        serde_json::from_str(&content).map_err(|err| {
            ReasoningError::Malformed(format!("completion body is not JSON ({err}): {content}"))
        })
    }
}

fn tag_transport_failure(message: String) -> ReasoningError {
    if is_rate_limit_message(&message) {
        ReasoningError::RateLimited(message)
    } else {
        ReasoningError::Upstream(message)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}
