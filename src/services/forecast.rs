//! Daily forecast selection.
//!
//! The provider returns one entry every 3 hours for five days. The daily
//! view keeps the first entry seen for each calendar date, in provider
//! order, and stops after five dates.

use std::collections::HashSet;

use crate::models::ForecastEntry;

/// Number of days shown in the daily forecast.
pub const DAILY_FORECAST_DAYS: usize = 5;

/// Calendar-date part of a provider timestamp ("2024-01-01 03:00:00" → "2024-01-01").
///
/// A timestamp without a space is its own date key.
pub fn calendar_date(dt_txt: &str) -> &str {
    dt_txt.split(' ').next().unwrap_or(dt_txt)
}

/// One entry per distinct calendar date, first-seen order, at most
/// [`DAILY_FORECAST_DAYS`] entries.
///
/// Single pass, no sorting: the input is expected to be chronological, as
/// the provider delivers it.
pub fn select_daily_forecasts(entries: &[ForecastEntry]) -> Vec<ForecastEntry> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(DAILY_FORECAST_DAYS);
    let mut selected = Vec::with_capacity(DAILY_FORECAST_DAYS);

    for entry in entries {
        if selected.len() == DAILY_FORECAST_DAYS {
            break;
        }
        if seen.insert(calendar_date(&entry.dt_txt)) {
            selected.push(entry.clone());
        }
    }

    selected
}
