//! Weather card endpoints.
//!
//! - GET /api/weather?city=NAME | ?lat=LAT&lon=LON
//! - GET /api/forecast?city=NAME | ?lat=LAT&lon=LON

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, ErrorResponse};
use crate::helpers::{day_label, icon_url, unix_to_rfc3339, visibility_km};
use crate::models::{ForecastEntry, WeatherSnapshot};
use crate::services::forecast::{calendar_date, select_daily_forecasts};
use crate::services::openweather::{LocationQuery, WeatherClient};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LocationParams {
    /// City name (e.g. "Zurich" or "Paris,FR"). Takes precedence over coordinates.
    pub city: Option<String>,
    /// Latitude in decimal degrees
    pub lat: Option<f64>,
    /// Longitude in decimal degrees
    pub lon: Option<f64>,
}

impl LocationParams {
    pub fn to_query(&self) -> Result<LocationQuery, AppError> {
        match (&self.city, self.lat, self.lon) {
            (Some(city), _, _) => LocationQuery::city(city),
            (None, Some(lat), Some(lon)) => LocationQuery::coordinates(lat, lon),
            _ => Err(AppError::BadRequest(
                "Provide either `city` or both `lat` and `lon`".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Current-conditions card.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherCard {
    /// Location name as resolved by the provider
    pub location: String,
    /// Condition icon (PNG), absent when the provider reports no condition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Condition text, e.g. "scattered clouds"
    pub description: String,
    pub temperature_f: f64,
    pub feels_like_f: f64,
    pub humidity_pct: f64,
    pub wind_speed_mph: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction_deg: Option<f64>,
    pub pressure_hpa: f64,
    pub visibility_km: Option<f64>,
    /// Sunrise (RFC 3339, UTC)
    pub sunrise: Option<String>,
    /// Sunset (RFC 3339, UTC)
    pub sunset: Option<String>,
    /// Language-model summary (view only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl WeatherCard {
    pub fn current(snapshot: &WeatherSnapshot, summary: Option<String>) -> Self {
        let condition = snapshot.primary_condition();
        Self {
            location: snapshot.name.clone(),
            icon_url: icon_url(condition.map(|c| c.icon.as_str())),
            description: condition.map(|c| c.description.clone()).unwrap_or_default(),
            temperature_f: snapshot.main.temp,
            feels_like_f: snapshot.main.feels_like,
            humidity_pct: snapshot.main.humidity,
            wind_speed_mph: snapshot.wind.speed,
            wind_direction_deg: snapshot.wind.deg,
            pressure_hpa: snapshot.main.pressure,
            visibility_km: visibility_km(snapshot.visibility),
            sunrise: unix_to_rfc3339(snapshot.sys.sunrise),
            sunset: unix_to_rfc3339(snapshot.sys.sunset),
            summary,
        }
    }
}

/// One day of the daily forecast.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ForecastCard {
    /// Calendar date, "YYYY-MM-DD"
    pub date: String,
    /// e.g. "Monday, January 1"; falls back to the raw timestamp
    pub day_label: String,
    /// Provider timestamp of the representative entry
    pub forecast_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub description: String,
    pub temperature_f: f64,
    pub feels_like_f: f64,
    pub humidity_pct: f64,
    pub wind_speed_mph: f64,
    pub pressure_hpa: f64,
    pub visibility_km: Option<f64>,
    /// Probability of precipitation, 0..1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation_probability: Option<f64>,
}

impl ForecastCard {
    pub fn daily(entry: &ForecastEntry) -> Self {
        let condition = entry.primary_condition();
        Self {
            date: calendar_date(&entry.dt_txt).to_string(),
            day_label: day_label(&entry.dt_txt).unwrap_or_else(|| entry.dt_txt.clone()),
            forecast_time: entry.dt_txt.clone(),
            icon_url: icon_url(condition.map(|c| c.icon.as_str())),
            description: condition.map(|c| c.description.clone()).unwrap_or_default(),
            temperature_f: entry.main.temp,
            feels_like_f: entry.main.feels_like,
            humidity_pct: entry.main.humidity,
            wind_speed_mph: entry.wind.speed,
            pressure_hpa: entry.main.pressure,
            visibility_km: visibility_km(entry.visibility),
            precipitation_probability: entry.pop,
        }
    }
}

/// Daily forecast response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyForecastResponse {
    /// Location name reported by the provider, when present
    pub location: Option<String>,
    /// One card per calendar date, at most five
    pub days: Vec<ForecastCard>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn location_from(
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<LocationQuery, AppError> {
    let Query(params) =
        params.map_err(|e| AppError::BadRequest(format!("Invalid query: {}", e.body_text())))?;
    params.to_query()
}

/// Current weather card for a city or coordinates.
#[utoipa::path(
    get,
    path = "/api/weather",
    tag = "Weather",
    params(LocationParams),
    responses(
        (status = 200, description = "Current weather card", body = WeatherCard),
        (status = 400, description = "Missing or invalid location", body = ErrorResponse),
        (status = 404, description = "Location not known to the provider", body = ErrorResponse),
        (status = 502, description = "Weather provider unavailable", body = ErrorResponse),
    )
)]
pub async fn get_current_weather(
    State(client): State<WeatherClient>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<Json<WeatherCard>, AppError> {
    let location = location_from(params)?;
    let snapshot = client.current(&location).await?;
    Ok(Json(WeatherCard::current(&snapshot, None)))
}

/// Five-day forecast, one card per calendar date.
#[utoipa::path(
    get,
    path = "/api/forecast",
    tag = "Weather",
    params(LocationParams),
    responses(
        (status = 200, description = "Daily forecast cards", body = DailyForecastResponse),
        (status = 400, description = "Missing or invalid location", body = ErrorResponse),
        (status = 404, description = "Location not known to the provider", body = ErrorResponse),
        (status = 502, description = "Weather provider unavailable", body = ErrorResponse),
    )
)]
pub async fn get_daily_forecast(
    State(client): State<WeatherClient>,
    params: Result<Query<LocationParams>, QueryRejection>,
) -> Result<Json<DailyForecastResponse>, AppError> {
    let location = location_from(params)?;
    let forecast = client.forecast(&location).await?;

    let days = select_daily_forecasts(&forecast.list)
        .iter()
        .map(ForecastCard::daily)
        .collect();

    Ok(Json(DailyForecastResponse {
        location: forecast.city.map(|c| c.name).filter(|n| !n.is_empty()),
        days,
    }))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::fixtures;
    use crate::services::retry::RetryPolicy;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(server: &MockServer) -> Router {
        let client = WeatherClient::new(
            &server.uri(),
            "test-key",
            Duration::from_secs(5),
            RetryPolicy::none(),
        )
        .unwrap();
        Router::new()
            .route("/api/weather", get(get_current_weather))
            .route("/api/forecast", get(get_daily_forecast))
            .with_state(client)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_weather_card_fields() {
        let snapshot: WeatherSnapshot =
            serde_json::from_value(fixtures::current_weather_json("Boston")).unwrap();
        let card = WeatherCard::current(&snapshot, Some("Cool.".to_string()));

        assert_eq!(card.location, "Boston");
        assert_eq!(
            card.icon_url.as_deref(),
            Some("https://openweathermap.org/img/wn/03d@2x.png")
        );
        assert_eq!(card.description, "scattered clouds");
        assert_eq!(card.temperature_f, 61.5);
        assert_eq!(card.visibility_km, Some(10.0));
        assert_eq!(card.wind_direction_deg, Some(270.0));
        assert_eq!(card.summary.as_deref(), Some("Cool."));
        assert!(card.sunrise.is_some());
    }

    #[test]
    fn test_forecast_card_fields() {
        let entry: ForecastEntry =
            serde_json::from_value(fixtures::forecast_entry_json("2024-01-01 00:00:00", 40.0))
                .unwrap();
        let card = ForecastCard::daily(&entry);

        assert_eq!(card.date, "2024-01-01");
        assert_eq!(card.day_label, "Monday, January 1");
        assert_eq!(card.feels_like_f, 38.5);
        assert_eq!(card.visibility_km, Some(8.0));
        assert_eq!(card.precipitation_probability, Some(0.4));
    }

    #[test]
    fn test_cards_without_condition_have_no_icon() {
        let mut body = fixtures::current_weather_json("Nome");
        body["weather"] = serde_json::json!([]);
        let snapshot = WeatherSnapshot::from_raw(body).unwrap();

        let card = WeatherCard::current(&snapshot, None);
        assert_eq!(card.icon_url, None);
        assert_eq!(card.description, "");
        assert!(serde_json::to_value(&card).unwrap().get("icon_url").is_none());

        let mut entry = fixtures::forecast_entry_json("2024-01-01 00:00:00", 20.0);
        entry["weather"] = serde_json::json!([]);
        let entry: ForecastEntry = serde_json::from_value(entry).unwrap();
        assert_eq!(ForecastCard::daily(&entry).icon_url, None);
    }

    #[test]
    fn test_location_params() {
        let city = LocationParams {
            city: Some("Bern".into()),
            lat: Some(1.0),
            lon: Some(2.0),
        };
        assert_eq!(city.to_query().unwrap(), LocationQuery::City("Bern".into()));

        let missing_lon = LocationParams {
            city: None,
            lat: Some(1.0),
            lon: None,
        };
        assert!(matches!(missing_lon.to_query(), Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_get_current_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Boston"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(fixtures::current_weather_json("Boston")),
            )
            .mount(&server)
            .await;

        let (status, json) = get_json(app(&server), "/api/weather?city=Boston").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"], "Boston");
        assert_eq!(json["temperature_f"], 61.5);
        assert!(json.get("summary").is_none());
    }

    #[tokio::test]
    async fn test_get_daily_forecast_returns_five_days() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "37.77"))
            .and(query_param("lon", "-122.42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::forecast_json(6)))
            .mount(&server)
            .await;

        let (status, json) = get_json(app(&server), "/api/forecast?lat=37.77&lon=-122.42").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"], "San Francisco");
        let days = json["days"].as_array().unwrap();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0]["date"], "2024-01-01");
        assert_eq!(days[4]["date"], "2024-01-05");
    }

    #[tokio::test]
    async fn test_missing_location_is_bad_request() {
        let server = MockServer::start().await;
        let (status, json) = get_json(app(&server), "/api/weather").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("city"));
    }

    #[tokio::test]
    async fn test_invalid_coordinate_is_bad_request() {
        let server = MockServer::start().await;
        let (status, _) = get_json(app(&server), "/api/forecast?lat=north&lon=1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_city_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let (status, json) = get_json(app(&server), "/api/weather?city=Atlantis").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "city not found");
    }
}
