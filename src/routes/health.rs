use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::summary::SummaryRelayState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok", or "degraded" when summaries cannot be generated)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the language-model provider is configured
    pub llm_configured: bool,
}

/// Health check endpoint.
///
/// Returns status "degraded" (still 200) when no language-model key is
/// configured: weather lookups work, summaries fall back.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(relay): State<SummaryRelayState>) -> Json<HealthResponse> {
    let llm_ok = relay.is_configured();

    Json(HealthResponse {
        status: if llm_ok {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        llm_configured: llm_ok,
    })
}
