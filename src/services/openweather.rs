//! OpenWeatherMap 2.5 client.
//!
//! Fetches current conditions (`/weather`) and the 5-day/3-hour forecast
//! (`/forecast`) by city name or coordinates, always in imperial units.
//! See: https://openweathermap.org/current and https://openweathermap.org/forecast5

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Coordinates, ForecastList, WeatherSnapshot};
use crate::services::retry::{send_with_retry, RetryPolicy};

/// Unit system requested from the provider (°F, mph).
const UNITS: &str = "imperial";

/// Where to look up the weather.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

impl LocationQuery {
    /// Validated city query. The name is trimmed; blank names are rejected.
    pub fn city(name: &str) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest(
                "Please enter a city name.".to_string(),
            ));
        }
        Ok(LocationQuery::City(name.to_string()))
    }

    /// Validated coordinate query.
    pub fn coordinates(lat: f64, lon: f64) -> Result<Self, AppError> {
        let coords = Coordinates { lat, lon };
        if !coords.is_valid() {
            return Err(AppError::BadRequest(format!(
                "Coordinates out of range: lat={}, lon={}",
                lat, lon
            )));
        }
        Ok(LocationQuery::Coordinates(coords))
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::City(name) => vec![("q", name.clone())],
            LocationQuery::Coordinates(c) => {
                vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())]
            }
        }
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationQuery::City(name) => write!(f, "{}", name),
            LocationQuery::Coordinates(c) => write!(f, "({:.4}, {:.4})", c.lat, c.lon),
        }
    }
}

/// Error body returned by the provider, e.g. `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

/// Client for the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl WeatherClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        })
    }

    /// Current conditions for a location. The snapshot keeps the raw body.
    pub async fn current(&self, location: &LocationQuery) -> Result<WeatherSnapshot, AppError> {
        let raw: serde_json::Value = self.fetch("weather", location).await?;
        WeatherSnapshot::from_raw(raw).map_err(|e| {
            AppError::Provider(format!("OpenWeatherMap JSON parse error: {}", e))
        })
    }

    /// 5-day/3-hour forecast for a location.
    pub async fn forecast(&self, location: &LocationQuery) -> Result<ForecastList, AppError> {
        self.fetch("forecast", location).await
    }

    pub async fn current_by_city(&self, city: &str) -> Result<WeatherSnapshot, AppError> {
        self.current(&LocationQuery::city(city)?).await
    }

    pub async fn forecast_by_city(&self, city: &str) -> Result<ForecastList, AppError> {
        self.forecast(&LocationQuery::city(city)?).await
    }

    pub async fn current_by_coords(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, AppError> {
        self.current(&LocationQuery::coordinates(lat, lon)?).await
    }

    pub async fn forecast_by_coords(&self, lat: f64, lon: f64) -> Result<ForecastList, AppError> {
        self.forecast(&LocationQuery::coordinates(lat, lon)?).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &LocationQuery,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query = location.query_pairs();
        query.push(("appid", self.api_key.clone()));
        query.push(("units", UNITS.to_string()));

        tracing::debug!("Fetching OpenWeatherMap /{} for {}", endpoint, location);

        let response = send_with_retry(self.retry, "openweathermap", || {
            self.client.get(&url).query(&query).send()
        })
        .await
        .map_err(|e| {
            // Strip the URL: it carries the API key
            AppError::Provider(format!(
                "OpenWeatherMap request failed: {}",
                e.without_url()
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ProviderErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());

            tracing::warn!(
                "OpenWeatherMap /{} for {} returned HTTP {}: {}",
                endpoint,
                location,
                status,
                detail
            );

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(AppError::LocationNotFound(detail));
            }
            return Err(AppError::Provider(format!(
                "OpenWeatherMap returned HTTP {}: {}",
                status, detail
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::Provider(format!(
                "OpenWeatherMap JSON parse error: {}",
                e.without_url()
            ))
        })
    }
}
