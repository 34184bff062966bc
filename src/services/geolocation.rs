//! Single-shot location lookup for `current_location` searches.

use std::time::Duration;

use serde::Deserialize;

use crate::config::GeolocationConfig;
use crate::errors::AppError;
use crate::models::Coordinates;

const IP_LOOKUP_TIMEOUT_SECS: u64 = 5;

/// Response of an IP geolocation service. Accepts both the ip-api.com
/// (`lat`/`lon`) and ipapi.co (`latitude`/`longitude`) field names.
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub enum Geolocator {
    /// No location source available.
    Unsupported,
    /// Always resolves to the configured coordinates.
    Fixed(Coordinates),
    /// Approximate location of the service's public IP.
    IpLookup { client: reqwest::Client, url: String },
}

impl Geolocator {
    pub fn from_config(config: &GeolocationConfig) -> Result<Self, AppError> {
        Ok(match config {
            GeolocationConfig::Disabled => Geolocator::Unsupported,
            GeolocationConfig::Fixed(coords) => Geolocator::Fixed(*coords),
            GeolocationConfig::IpLookup { url } => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(IP_LOOKUP_TIMEOUT_SECS))
                    .build()
                    .map_err(|e| {
                        AppError::InternalError(format!("Failed to build HTTP client: {}", e))
                    })?;
                Geolocator::IpLookup {
                    client,
                    url: url.clone(),
                }
            }
        })
    }

    /// Resolve the current coordinates once.
    pub async fn locate(&self) -> Result<Coordinates, AppError> {
        match self {
            Geolocator::Unsupported => Err(AppError::UnsupportedEnvironment),
            Geolocator::Fixed(coords) => Ok(*coords),
            Geolocator::IpLookup { client, url } => lookup_ip_location(client, url).await,
        }
    }
}

async fn lookup_ip_location(client: &reqwest::Client, url: &str) -> Result<Coordinates, AppError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Geolocation(format!("location lookup failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Geolocation(format!(
            "location lookup returned HTTP {}",
            response.status()
        )));
    }

    let body: IpLookupResponse = response
        .json()
        .await
        .map_err(|e| AppError::Geolocation(format!("location lookup parse error: {}", e)))?;

    if body.status.as_deref() == Some("fail") {
        return Err(AppError::Geolocation(
            body.message
                .unwrap_or_else(|| "location lookup failed".to_string()),
        ));
    }

    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) if (Coordinates { lat, lon }).is_valid() => {
            tracing::debug!("Resolved location ({:.4}, {:.4}) by IP", lat, lon);
            Ok(Coordinates { lat, lon })
        }
        _ => Err(AppError::Geolocation(
            "location lookup returned no usable coordinates".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn ip_locator(server: &MockServer) -> Geolocator {
        Geolocator::from_config(&GeolocationConfig::IpLookup {
            url: format!("{}/json", server.uri()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_disabled_is_unsupported() {
        let locator = Geolocator::from_config(&GeolocationConfig::Disabled).unwrap();
        assert_eq!(
            locator.locate().await.unwrap_err(),
            AppError::UnsupportedEnvironment
        );
    }

    #[tokio::test]
    async fn test_fixed_location() {
        let coords = Coordinates {
            lat: 59.91,
            lon: 10.75,
        };
        let locator = Geolocator::from_config(&GeolocationConfig::Fixed(coords)).unwrap();
        assert_eq!(locator.locate().await.unwrap(), coords);
    }

    #[tokio::test]
    async fn test_ip_lookup_ip_api_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "city": "Zurich",
                "lat": 47.3769,
                "lon": 8.5417
            })))
            .mount(&server)
            .await;

        let coords = ip_locator(&server).await.locate().await.unwrap();
        assert_eq!(
            coords,
            Coordinates {
                lat: 47.3769,
                lon: 8.5417
            }
        );
    }

    #[tokio::test]
    async fn test_ip_lookup_latitude_longitude_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 51.5,
                "longitude": -0.12
            })))
            .mount(&server)
            .await;

        let coords = ip_locator(&server).await.locate().await.unwrap();
        assert_eq!(coords.lat, 51.5);
        assert_eq!(coords.lon, -0.12);
    }

    #[tokio::test]
    async fn test_ip_lookup_fail_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let err = ip_locator(&server).await.locate().await.unwrap_err();
        assert_eq!(err, AppError::Geolocation("private range".to_string()));
    }

    #[tokio::test]
    async fn test_ip_lookup_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = ip_locator(&server).await.locate().await.unwrap_err();
        assert!(matches!(err, AppError::Geolocation(_)));
    }

    #[tokio::test]
    async fn test_ip_lookup_missing_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "success" })),
            )
            .mount(&server)
            .await;

        let err = ip_locator(&server).await.locate().await.unwrap_err();
        assert!(matches!(err, AppError::Geolocation(_)));
    }
}
