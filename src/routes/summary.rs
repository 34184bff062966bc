use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::LlmSettings;
use crate::errors::{AppError, ErrorResponse};
use crate::services::llm::LlmClient;
use crate::services::summary::generate_summary;

/// State for the summary relay routes.
///
/// `http` is `None` when the HTTP client could not be built at startup; the
/// relay then fails every request with a client-initialization error.
#[derive(Clone)]
pub struct SummaryRelayState {
    pub http: Option<reqwest::Client>,
    pub settings: LlmSettings,
}

impl SummaryRelayState {
    /// Whether a completion call can be attempted at all.
    pub fn is_configured(&self) -> bool {
        self.http.is_some()
            && self
                .settings
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }

    fn client(&self) -> Result<LlmClient, AppError> {
        let http = self.http.clone().ok_or_else(|| {
            AppError::ProviderInit("HTTP client was not built at startup".to_string())
        })?;
        LlmClient::new(http, &self.settings)
    }
}

/// Summary request. `weatherData` is the current-weather snapshot exactly as
/// the weather provider returned it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryRequest {
    #[serde(rename = "weatherData", default)]
    #[schema(value_type = Object)]
    pub weather_data: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    /// Generated summary text
    pub summary: String,
}

/// Generate a short natural-language summary of a weather snapshot.
///
/// Also served at `/api/route`.
#[utoipa::path(
    post,
    path = "/api/summary",
    tag = "Summary",
    request_body = SummaryRequest,
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 400, description = "Body is not valid JSON", body = ErrorResponse),
        (status = 500, description = "Client initialization or generation failed", body = ErrorResponse),
    )
)]
pub async fn create_summary(
    State(state): State<SummaryRelayState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Json(request) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let llm = state.client()?;
    let summary = generate_summary(&llm, &request.weather_data).await?;

    tracing::debug!("Generated summary ({} chars)", summary.len());
    Ok(Json(SummaryResponse { summary }))
}
