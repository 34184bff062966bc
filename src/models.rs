//! OpenWeatherMap data model.
//!
//! Field names follow the provider's JSON so a snapshot can be forwarded to
//! the summary relay exactly as it was received. Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// One entry of the provider's `weather` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MainReadings {
    /// Temperature in °F
    pub temp: f64,
    /// Feels-like temperature in °F
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Sea-level pressure in hPa
    pub pressure: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Wind {
    /// Wind speed in mph
    pub speed: f64,
    /// Direction the wind blows from, in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gust: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SunTimes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Sunrise, unix seconds (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise: Option<i64>,
    /// Sunset, unix seconds (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset: Option<i64>,
}

/// Provider response for current conditions (`GET /weather`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherSnapshot {
    /// Location name as resolved by the provider
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<Coordinates>,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
    pub main: MainReadings,
    pub wind: Wind,
    /// Visibility in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub sys: SunTimes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<i64>,
    /// Provider body exactly as received. `Null` unless built by [`WeatherSnapshot::from_raw`].
    #[serde(skip)]
    pub raw: Value,
}

impl WeatherSnapshot {
    /// Decode a provider body and keep the original JSON alongside the typed fields.
    pub fn from_raw(raw: Value) -> Result<Self, serde_json::Error> {
        let mut snapshot: Self = serde_json::from_value(raw.clone())?;
        snapshot.raw = raw;
        Ok(snapshot)
    }

    pub fn primary_condition(&self) -> Option<&WeatherCondition> {
        self.weather.first()
    }
}

/// One 3-hour prediction of the forecast list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<i64>,
    /// "YYYY-MM-DD HH:MM:SS" (UTC)
    pub dt_txt: String,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
    pub main: MainReadings,
    pub wind: Wind,
    /// Visibility in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    /// Probability of precipitation, 0..1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pop: Option<f64>,
}

impl ForecastEntry {
    pub fn primary_condition(&self) -> Option<&WeatherCondition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<Coordinates>,
}

/// Provider response for the 5-day/3-hour forecast (`GET /forecast`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastList {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<ForecastCity>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_parses_provider_json() {
        let snapshot: WeatherSnapshot =
            serde_json::from_value(fixtures::current_weather_json("San Francisco")).unwrap();
        assert_eq!(snapshot.name, "San Francisco");
        assert_eq!(snapshot.main.humidity, 72.0);
        assert_eq!(snapshot.visibility, Some(10000.0));
        assert_eq!(snapshot.sys.sunrise, Some(1704122149));
        assert_eq!(
            snapshot.primary_condition().map(|c| c.description.as_str()),
            Some("scattered clouds")
        );
    }

    #[test]
    fn test_snapshot_serializes_with_provider_field_names() {
        let snapshot: WeatherSnapshot =
            serde_json::from_value(fixtures::current_weather_json("Oslo")).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["weather"][0]["description"], "scattered clouds");
        assert_eq!(json["main"]["temp"], 61.5);
    }

    #[test]
    fn test_from_raw_keeps_provider_numbers() {
        let mut body = fixtures::current_weather_json("Reno");
        body["main"]["temp"] = serde_json::json!(50);

        let snapshot = WeatherSnapshot::from_raw(body.clone()).unwrap();

        assert_eq!(snapshot.main.temp, 50.0);
        assert_eq!(snapshot.raw, body);
        assert_eq!(snapshot.raw["main"]["temp"].to_string(), "50");
    }

    #[test]
    fn test_forecast_list_ignores_unknown_fields() {
        let forecast: ForecastList = serde_json::from_value(fixtures::forecast_json(2)).unwrap();
        assert_eq!(forecast.list.len(), 16);
        assert_eq!(forecast.list[0].dt_txt, "2024-01-01 00:00:00");
        assert_eq!(forecast.city.map(|c| c.name), Some("San Francisco".to_string()));
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates { lat: 0.0, lon: 0.0 }.is_valid());
        assert!(Coordinates { lat: -90.0, lon: 180.0 }.is_valid());
        assert!(!Coordinates { lat: 90.5, lon: 0.0 }.is_valid());
        assert!(!Coordinates { lat: 0.0, lon: -181.0 }.is_valid());
        assert!(!Coordinates { lat: f64::NAN, lon: 0.0 }.is_valid());
    }
}
