use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::{AppConfig, LogFormat};
use routes::summary::SummaryRelayState;
use services::geolocation::Geolocator;
use services::openweather::WeatherClient;
use services::retry::RetryPolicy;
use services::summary_client::SummaryClient;
use services::view::{SharedWeatherView, WeatherView};

/// OpenAPI document for the Weather Check API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Check API",
        version = "0.1.0",
        description = "Weather lookup by city or location. Current conditions and a \
            five-day daily forecast from OpenWeatherMap, plus a short language-model \
            summary of the current conditions.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Current weather and daily forecast cards"),
        (name = "Summary", description = "Language-model weather summaries"),
        (name = "View", description = "Search-driven weather view"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_current_weather,
        routes::weather::get_daily_forecast,
        routes::summary::create_summary,
        routes::view::get_view,
        routes::view::post_search,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::weather::WeatherCard,
            routes::weather::ForecastCard,
            routes::weather::DailyForecastResponse,
            routes::summary::SummaryRequest,
            routes::summary::SummaryResponse,
            routes::view::ViewResponse,
            services::view::SearchTrigger,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    let (json_layer, text_layer) = match LogFormat::from_env() {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_check=debug,tower_http=debug".into()),
        )
        .with(json_layer)
        .with(text_layer)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let weather_client = match WeatherClient::new(
        &config.openweather_base_url,
        &config.openweather_api_key,
        Duration::from_secs(config.weather_timeout_secs),
        RetryPolicy::new(config.weather_max_retries),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create weather client: {}", e);
            std::process::exit(1);
        }
    };

    let summary_client = match SummaryClient::new(
        &config.summary_relay_url,
        Duration::from_secs(config.summary_timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create summary client: {}", e);
            std::process::exit(1);
        }
    };

    let geolocator = match Geolocator::from_config(&config.geolocation) {
        Ok(geolocator) => geolocator,
        Err(e) => {
            tracing::error!("Failed to create geolocator: {}", e);
            std::process::exit(1);
        }
    };

    // The relay keeps running without a usable client; each request then
    // reports the initialization failure.
    let relay_state = SummaryRelayState {
        http: services::llm::build_http_client(&config.llm)
            .map_err(|e| tracing::error!("{}", e))
            .ok(),
        settings: config.llm.clone(),
    };
    if !relay_state.is_configured() {
        tracing::warn!("OPENAI_API_KEY is not set; summaries will fall back");
    }

    let view: SharedWeatherView = Arc::new(WeatherView::new(
        weather_client.clone(),
        summary_client,
        geolocator,
    ));

    // CORS: browser clients call both GET and POST endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    // Build router
    let weather_routes = Router::new()
        .route("/api/weather", get(routes::weather::get_current_weather))
        .route("/api/forecast", get(routes::weather::get_daily_forecast))
        .with_state(weather_client);

    // `/api/route` is the older path of the same relay
    let summary_routes = Router::new()
        .route("/api/summary", post(routes::summary::create_summary))
        .route("/api/route", post(routes::summary::create_summary))
        .with_state(relay_state.clone());

    let view_routes = Router::new()
        .route("/api/view", get(routes::view::get_view))
        .route("/api/view/search", post(routes::view::post_search))
        .with_state(view);

    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(relay_state);

    let app = Router::new()
        .merge(health_routes)
        .merge(weather_routes)
        .merge(summary_routes)
        .merge(view_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server terminated unexpectedly: {}", e);
        std::process::exit(1);
    }
}
