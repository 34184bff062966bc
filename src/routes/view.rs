use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::helpers::today_label;
use crate::routes::weather::{ForecastCard, WeatherCard};
use crate::services::view::{SearchTrigger, SharedWeatherView, ViewState};

/// Rendered view: status plus whatever the current state displays.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewResponse {
    /// "idle", "loading", "success" or "error"
    pub status: String,
    /// Today's date, e.g. "1/1/2024"
    pub today: String,
    /// Error text, present only in the error state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Search being resolved, present only while loading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchTrigger>,
    /// Current-conditions card with summary, present only on success
    pub current: Option<WeatherCard>,
    /// Daily forecast cards, empty unless successful
    pub forecast: Vec<ForecastCard>,
}

impl ViewResponse {
    pub fn render(state: &ViewState) -> Self {
        let mut response = ViewResponse {
            status: state.status().to_string(),
            today: today_label(),
            message: None,
            search: None,
            current: None,
            forecast: Vec::new(),
        };

        match state {
            ViewState::Idle => {}
            ViewState::Loading { trigger, .. } => response.search = Some(trigger.clone()),
            ViewState::Success(outcome) => {
                response.current = Some(WeatherCard::current(
                    &outcome.weather,
                    Some(outcome.summary.clone()),
                ));
                response.forecast = outcome.forecast.iter().map(ForecastCard::daily).collect();
            }
            ViewState::Error { message } => response.message = Some(message.clone()),
        }

        response
    }
}

/// Current view state.
#[utoipa::path(
    get,
    path = "/api/view",
    tag = "View",
    responses(
        (status = 200, description = "Current view", body = ViewResponse),
    )
)]
pub async fn get_view(State(view): State<SharedWeatherView>) -> Json<ViewResponse> {
    Json(ViewResponse::render(&view.state().await))
}

/// Start a search and return the view once it settles.
///
/// Failures of the search itself are reported in the view (`status: "error"`),
/// not as an HTTP error.
#[utoipa::path(
    post,
    path = "/api/view/search",
    tag = "View",
    request_body = SearchTrigger,
    responses(
        (status = 200, description = "View after the search", body = ViewResponse),
        (status = 400, description = "Invalid search request", body = ErrorResponse),
    )
)]
pub async fn post_search(
    State(view): State<SharedWeatherView>,
    payload: Result<Json<SearchTrigger>, JsonRejection>,
) -> Result<Json<ViewResponse>, AppError> {
    let Json(trigger) = payload
        .map_err(|e| AppError::BadRequest(format!("Invalid search request: {}", e.body_text())))?;

    let state = view.search(trigger).await;
    Ok(Json(ViewResponse::render(&state)))
}
