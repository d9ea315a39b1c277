use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use crate::needs::NeedsError;
use crate::planning::PlanError;
use crate::reasoning::ReasoningError;
use crate::telemetry::TelemetryError;

/// Top-level error surface. The HTTP boundary maps variants to status codes;
/// nothing below this layer knows about transports.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("needs lookup error: {0}")]
    Needs(#[from] NeedsError),
    #[error("planning error: {0}")]
    Plan(#[from] PlanError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Needs(NeedsError::UnknownRegion(_))
            | AppError::Plan(PlanError::Needs(NeedsError::UnknownRegion(_))) => {
                StatusCode::NOT_FOUND
            }
            AppError::Plan(PlanError::Reasoning(ReasoningError::Unconfigured)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Plan(PlanError::Reasoning(_)) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Needs(_)
            | AppError::Plan(PlanError::Needs(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_map_to_distinct_status_codes() {
        let not_found = AppError::Needs(NeedsError::UnknownRegion("Atlantis".to_string()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let unconfigured = AppError::Plan(PlanError::Reasoning(ReasoningError::Unconfigured));
        assert_eq!(unconfigured.status(), StatusCode::SERVICE_UNAVAILABLE);

        let malformed = AppError::Plan(PlanError::Reasoning(ReasoningError::Malformed(
            "not json".to_string(),
        )));
        assert_eq!(malformed.status(), StatusCode::BAD_GATEWAY);

        let pipeline_not_found = AppError::Plan(PlanError::Needs(NeedsError::UnknownRegion(
            "Atlantis".to_string(),
        )));
        assert_eq!(pipeline_not_found.status(), StatusCode::NOT_FOUND);
    }
}
