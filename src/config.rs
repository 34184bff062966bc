use std::str::FromStr;

use crate::models::Coordinates;

const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WEATHER_MAX_RETRIES: u32 = 2;
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4";
const DEFAULT_LLM_MAX_TOKENS: u32 = 50;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SUMMARY_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_GEOLOCATION_URL: &str = "http://ip-api.com/json";

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings for the language-model provider behind the summary relay.
///
/// `api_key` stays optional so the service can start without it; the relay
/// then answers every request with a client-initialization error.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// How `current_location` searches obtain coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum GeolocationConfig {
    Disabled,
    Fixed(Coordinates),
    IpLookup { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT`; anything other than `json` means plain text.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub weather_timeout_secs: u64,
    pub weather_max_retries: u32,
    pub llm: LlmSettings,
    /// Where the summary client posts snapshots. Defaults to this service's own relay.
    pub summary_relay_url: String,
    pub summary_timeout_secs: u64,
    pub geolocation: GeolocationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&get, "PORT", DEFAULT_PORT)?;

        let openweather_api_key =
            get("OPENWEATHER_API_KEY").ok_or(ConfigError::Missing("OPENWEATHER_API_KEY"))?;

        let llm = LlmSettings {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS)?,
            timeout_secs: parse_or(&get, "LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?,
        };

        let geolocation = match get("GEOLOCATION_MODE")
            .map(|m| m.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("disabled") => GeolocationConfig::Disabled,
            Some("fixed") => {
                let lat: f64 = parse_required(&get, "GEOLOCATION_LAT")?;
                let lon: f64 = parse_required(&get, "GEOLOCATION_LON")?;
                let coords = Coordinates { lat, lon };
                if !coords.is_valid() {
                    return Err(ConfigError::Invalid {
                        key: "GEOLOCATION_LAT/GEOLOCATION_LON",
                        value: format!("{},{}", lat, lon),
                    });
                }
                GeolocationConfig::Fixed(coords)
            }
            Some("ip") => GeolocationConfig::IpLookup {
                url: get("GEOLOCATION_URL").unwrap_or_else(|| DEFAULT_GEOLOCATION_URL.to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "GEOLOCATION_MODE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            port,
            openweather_api_key,
            openweather_base_url: get("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
            weather_timeout_secs: parse_or(
                &get,
                "WEATHER_TIMEOUT_SECS",
                DEFAULT_WEATHER_TIMEOUT_SECS,
            )?,
            weather_max_retries: parse_or(
                &get,
                "WEATHER_MAX_RETRIES",
                DEFAULT_WEATHER_MAX_RETRIES,
            )?,
            llm,
            summary_relay_url: get("SUMMARY_RELAY_URL")
                .unwrap_or_else(|| format!("http://127.0.0.1:{}/api/summary", port)),
            summary_timeout_secs: parse_or(
                &get,
                "SUMMARY_TIMEOUT_SECS",
                DEFAULT_SUMMARY_TIMEOUT_SECS,
            )?,
            geolocation,
        })
    }
}

fn parse_or<T, F>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_required<T, F>(get: &F, key: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = get(key).ok_or(ConfigError::Missing(key))?;
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}
