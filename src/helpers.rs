//! Display conversions shared by the card renderers.
//!
//! Provider values arrive in imperial units except visibility (meters) and
//! timestamps (unix seconds / "YYYY-MM-DD HH:MM:SS" strings).

use chrono::{DateTime, Local, NaiveDateTime, Utc};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Format used by the provider's `dt_txt` field.
pub(crate) const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// URL of the 2x PNG for a provider icon code (e.g. "10d"), if there is one.
pub(crate) fn icon_url(icon: Option<&str>) -> Option<String> {
    icon.map(str::trim)
        .filter(|i| !i.is_empty())
        .map(|i| format!("{}/{}@2x.png", ICON_BASE_URL, i))
}

/// Convert a visibility in meters to kilometres.
pub(crate) fn visibility_km(meters: Option<f64>) -> Option<f64> {
    meters.filter(|m| m.is_finite()).map(|m| m / 1000.0)
}

/// Weekday label for a forecast timestamp, e.g. "Monday, January 1".
///
/// Returns `None` when `dt_txt` is not in the provider's format.
pub(crate) fn day_label(dt_txt: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(dt_txt, DT_TXT_FORMAT)
        .ok()
        .map(|dt| dt.format("%A, %B %-d").to_string())
}

/// Convert unix seconds to an RFC 3339 string.
pub(crate) fn unix_to_rfc3339(secs: Option<i64>) -> Option<String> {
    secs.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|dt| dt.to_rfc3339())
}

/// Today's date in local time, e.g. "1/31/2024".
pub(crate) fn today_label() -> String {
    Local::now().format("%-m/%-d/%Y").to_string()
}
