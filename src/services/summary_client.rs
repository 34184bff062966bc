//! Client side of the summary relay.
//!
//! A summary is decoration: every failure collapses into
//! [`SUMMARY_FALLBACK`] so the weather display is never held back by it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::WeatherSnapshot;

pub const SUMMARY_FALLBACK: &str = "Unable to generate summary.";

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    #[serde(rename = "weatherData")]
    weather_data: &'a Value,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    summary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SummaryClient {
    client: reqwest::Client,
    relay_url: String,
}

impl SummaryClient {
    pub fn new(relay_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            relay_url: relay_url.to_string(),
        })
    }

    /// Summary text for a snapshot, or the fallback text on any failure.
    pub async fn summarize(&self, snapshot: &WeatherSnapshot) -> String {
        match self.request_summary(snapshot).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Summary for '{}' unavailable: {}", snapshot.name, e);
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    async fn request_summary(&self, snapshot: &WeatherSnapshot) -> Result<String, AppError> {
        // Forward the provider body untouched so numbers keep their original form
        let typed;
        let weather_data = if snapshot.raw.is_null() {
            typed = serde_json::to_value(snapshot)
                .map_err(|e| AppError::Generation(format!("snapshot encode error: {}", e)))?;
            &typed
        } else {
            &snapshot.raw
        };

        let response = self
            .client
            .post(&self.relay_url)
            .json(&RelayRequest { weather_data })
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("relay request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Generation(format!(
                "relay returned HTTP {}",
                status
            )));
        }

        let body: RelayResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("relay JSON parse error: {}", e)))?;

        body.summary
            .ok_or_else(|| AppError::Generation("relay response has no summary".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::services::summary::PromptInputs;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot::from_raw(fixtures::current_weather_json("Denver")).unwrap()
    }

    fn client_for(server: &MockServer) -> SummaryClient {
        SummaryClient::new(
            &format!("{}/api/summary", server.uri()),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_summarize_posts_weather_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summary"))
            .and(body_partial_json(serde_json::json!({
                "weatherData": {
                    "name": "Denver",
                    "weather": [ { "description": "scattered clouds" } ],
                    "main": { "temp": 61.5 }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "summary": "A cool, partly cloudy day."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = client_for(&server).summarize(&snapshot()).await;
        assert_eq!(summary, "A cool, partly cloudy day.");
    }

    #[tokio::test]
    async fn test_integer_temperature_reaches_relay_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summary"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "summary": "ok" })),
            )
            .mount(&server)
            .await;

        let mut body = fixtures::current_weather_json("Denver");
        body["main"]["temp"] = serde_json::json!(50);
        let snapshot = WeatherSnapshot::from_raw(body).unwrap();

        client_for(&server).summarize(&snapshot).await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let posted: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let prompt = PromptInputs::from_snapshot(&posted["weatherData"])
            .unwrap()
            .prompt();
        assert_eq!(
            prompt,
            "The weather is described as scattered clouds with a temperature of 50°F. Please provide a summary."
        );
    }

    #[tokio::test]
    async fn test_snapshot_without_raw_body_is_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summary"))
            .and(body_partial_json(serde_json::json!({
                "weatherData": { "name": "Denver", "main": { "temp": 61.5 } }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "summary": "ok" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let typed: WeatherSnapshot =
            serde_json::from_value(fixtures::current_weather_json("Denver")).unwrap();
        assert!(typed.raw.is_null());

        assert_eq!(client_for(&server).summarize(&typed).await, "ok");
    }

    #[tokio::test]
    async fn test_relay_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summary"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Error generating summary"
            })))
            .mount(&server)
            .await;

        let summary = client_for(&server).summarize(&snapshot()).await;
        assert_eq!(summary, SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn test_missing_summary_field_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let summary = client_for(&server).summarize(&snapshot()).await;
        assert_eq!(summary, SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn test_slow_relay_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summary"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "summary": "late" }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = SummaryClient::new(
            &format!("{}/api/summary", server.uri()),
            Duration::from_millis(50),
        )
        .unwrap();

        assert_eq!(client.summarize(&snapshot()).await, SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn test_unreachable_relay_falls_back() {
        let client = SummaryClient::new(
            "http://127.0.0.1:1/api/summary",
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(client.summarize(&snapshot()).await, SUMMARY_FALLBACK);
    }
}
