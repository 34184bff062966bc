use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Body returned by the relay when summary generation fails.
pub const GENERATION_FAILED_MESSAGE: &str = "Error generating summary";

/// Body returned by the relay when the language-model client cannot be built.
pub const PROVIDER_INIT_FAILED_MESSAGE: &str = "Failed to initialize language model client";

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The weather provider does not know the requested location (HTTP 404).
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// The weather provider call failed (network, non-2xx, undecodable body).
    #[error("Weather provider error: {0}")]
    Provider(String),

    /// The language-model client could not be constructed.
    #[error("Language model client initialization failed: {0}")]
    ProviderInit(String),

    /// The completion call failed or the snapshot was unusable.
    #[error("Summary generation failed: {0}")]
    Generation(String),

    #[error("Geolocation failed: {0}")]
    Geolocation(String),

    #[error("Geolocation is not supported in this environment")]
    UnsupportedEnvironment,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Message shown to the user when a search ends in this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::BadRequest(msg) => msg.clone(),
            AppError::LocationNotFound(_) => {
                "Location not found. Check the city name and try again.".to_string()
            }
            AppError::Provider(_) => {
                "Unable to fetch weather data right now. Please try again.".to_string()
            }
            AppError::ProviderInit(_) | AppError::Generation(_) => {
                "Unable to generate summary.".to_string()
            }
            AppError::Geolocation(_) => "Unable to determine your location.".to_string(),
            AppError::UnsupportedEnvironment => {
                "Geolocation is not supported in this environment.".to_string()
            }
            AppError::InternalError(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::LocationNotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Provider(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::ProviderInit(msg) => {
                tracing::error!("Language model client initialization error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    PROVIDER_INIT_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Summary generation error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERATION_FAILED_MESSAGE.to_string(),
                )
            }
            AppError::Geolocation(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::UnsupportedEnvironment => (StatusCode::NOT_IMPLEMENTED, self.to_string()),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}
