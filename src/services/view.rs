//! Weather view state machine.
//!
//! ```text
//! idle/error/success --search--> loading --ok--> success
//!                                loading --err-> error
//! ```
//!
//! Each search runs one sequential chain: resolve location, current
//! weather, summary, forecast, daily selection. A new search cancels the
//! chain in flight; a chain that finishes after a newer search started is
//! discarded by its generation number.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::{ForecastEntry, WeatherSnapshot};
use crate::services::forecast::select_daily_forecasts;
use crate::services::geolocation::Geolocator;
use crate::services::openweather::{LocationQuery, WeatherClient};
use crate::services::summary_client::SummaryClient;

/// What started a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchTrigger {
    /// Explicit city submission.
    City { city: String },
    /// Coordinates supplied by the caller (e.g. a browser geolocation callback).
    Coordinates { lat: f64, lon: f64 },
    /// Coordinates resolved by the service's own geolocator.
    CurrentLocation,
}

/// Everything a successful search displays.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub weather: WeatherSnapshot,
    /// Daily selection, at most five entries.
    pub forecast: Vec<ForecastEntry>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading {
        trigger: SearchTrigger,
        generation: u64,
    },
    Success(SearchOutcome),
    Error {
        message: String,
    },
}

impl ViewState {
    pub fn status(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading { .. } => "loading",
            ViewState::Success(_) => "success",
            ViewState::Error { .. } => "error",
        }
    }
}

/// Bookkeeping for the search currently allowed to finish.
#[derive(Debug, Default)]
struct InFlight {
    generation: u64,
    cancel: Option<CancellationToken>,
}

pub struct WeatherView {
    weather: WeatherClient,
    summaries: SummaryClient,
    geolocator: Geolocator,
    state: RwLock<ViewState>,
    in_flight: Mutex<InFlight>,
}

/// Shared view handle.
pub type SharedWeatherView = Arc<WeatherView>;

impl WeatherView {
    pub fn new(weather: WeatherClient, summaries: SummaryClient, geolocator: Geolocator) -> Self {
        Self {
            weather,
            summaries,
            geolocator,
            state: RwLock::new(ViewState::Idle),
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Run a search to completion and return the state it leaves behind.
    ///
    /// When a newer search supersedes this one, the newer search's state is
    /// returned instead. The search runs on its own task and settles the
    /// view even if the caller stops waiting.
    pub async fn search(self: &Arc<Self>, trigger: SearchTrigger) -> ViewState {
        let view = Arc::clone(self);
        let task = tokio::spawn(async move { view.run_search(trigger).await });

        match task.await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Search task failed: {}", e);
                self.state().await
            }
        }
    }

    async fn run_search(&self, trigger: SearchTrigger) -> ViewState {
        let (generation, cancel) = self.begin(&trigger).await;
        tracing::info!("Search #{} started: {:?}", generation, trigger);

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Search #{} cancelled by a newer search", generation);
                return self.state().await;
            }
            result = self.run_chain(&trigger) => result,
        };

        self.finish(generation, result).await
    }

    async fn begin(&self, trigger: &SearchTrigger) -> (u64, CancellationToken) {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(previous) = in_flight.cancel.take() {
            previous.cancel();
        }

        let cancel = CancellationToken::new();
        in_flight.generation += 1;
        in_flight.cancel = Some(cancel.clone());

        *self.state.write().await = ViewState::Loading {
            trigger: trigger.clone(),
            generation: in_flight.generation,
        };

        (in_flight.generation, cancel)
    }

    async fn finish(
        &self,
        generation: u64,
        result: Result<SearchOutcome, AppError>,
    ) -> ViewState {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.generation != generation {
            tracing::debug!("Discarding stale result of search #{}", generation);
            drop(in_flight);
            return self.state().await;
        }
        in_flight.cancel = None;

        let next = match result {
            Ok(outcome) => {
                tracing::info!(
                    "Search #{} succeeded: {} with {} forecast days",
                    generation,
                    outcome.weather.name,
                    outcome.forecast.len()
                );
                ViewState::Success(outcome)
            }
            Err(e) => {
                tracing::warn!("Search #{} failed: {}", generation, e);
                ViewState::Error {
                    message: e.user_message(),
                }
            }
        };

        *self.state.write().await = next.clone();
        next
    }

    async fn run_chain(&self, trigger: &SearchTrigger) -> Result<SearchOutcome, AppError> {
        let location = self.resolve_location(trigger).await?;

        let weather = self.weather.current(&location).await?;
        let summary = self.summaries.summarize(&weather).await;
        let forecast = self.weather.forecast(&location).await?;

        Ok(SearchOutcome {
            forecast: select_daily_forecasts(&forecast.list),
            weather,
            summary,
        })
    }

    async fn resolve_location(&self, trigger: &SearchTrigger) -> Result<LocationQuery, AppError> {
        match trigger {
            SearchTrigger::City { city } => LocationQuery::city(city),
            SearchTrigger::Coordinates { lat, lon } => LocationQuery::coordinates(*lat, *lon),
            SearchTrigger::CurrentLocation => {
                let coords = self.geolocator.locate().await?;
                LocationQuery::coordinates(coords.lat, coords.lon)
            }
        }
    }
}
