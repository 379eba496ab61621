// src/intake/validators.rs
// Intake-time checks on raw field values. Failures are `None`, never errors.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use std::ops::RangeInclusive;

use crate::trip::GeoPoint;

/// Latitude box of the service area, derived from the cleaned training data
pub const INTAKE_LATITUDE_RANGE: RangeInclusive<f64> = -75.0..=65.0;

/// Longitude box of the service area, derived from the cleaned training data
pub const INTAKE_LONGITUDE_RANGE: RangeInclusive<f64> = -98.0..=41.0;

/// Earliest trip year the model has seen
pub const MIN_PICKUP_YEAR: i32 = 2009;

/// How many years past the current one a pickup may be scheduled
pub const MAX_YEARS_AHEAD: i32 = 5;

/// Accept a numeric point if it lies inside the intake box.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Option<GeoPoint> {
    if !INTAKE_LATITUDE_RANGE.contains(&latitude) {
        return None;
    }
    if !INTAKE_LONGITUDE_RANGE.contains(&longitude) {
        return None;
    }
    Some(GeoPoint {
        latitude,
        longitude,
    })
}

/// Parse two textual values as a point, then apply [`validate_coordinates`].
pub fn parse_coordinates(latitude: &str, longitude: &str) -> Option<GeoPoint> {
    let latitude = latitude.trim().parse::<f64>().ok()?;
    let longitude = longitude.trim().parse::<f64>().ok()?;
    validate_coordinates(latitude, longitude)
}

/// Parse an ISO-8601 pickup time and check its year against today.
pub fn validate_datetime(text: &str) -> Option<NaiveDateTime> {
    validate_datetime_at(text, Local::now().year())
}

/// Same as [`validate_datetime`] with an explicit current year.
pub fn validate_datetime_at(text: &str, current_year: i32) -> Option<NaiveDateTime> {
    let parsed = parse_iso8601(text.trim())?;
    pickup_year_allowed(parsed.year(), current_year).then_some(parsed)
}

/// Pickup years run from [`MIN_PICKUP_YEAR`] to `current_year + MAX_YEARS_AHEAD`.
pub fn pickup_year_allowed(year: i32, current_year: i32) -> bool {
    (MIN_PICKUP_YEAR..=current_year + MAX_YEARS_AHEAD).contains(&year)
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// `%z` also takes offsets written without a colon, such as `+0300`
const OFFSET_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

// Offset-qualified values keep their wall-clock time; the offset itself is dropped.
fn parse_iso8601(text: &str) -> Option<NaiveDateTime> {
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    let zulu_normalized = text
        .strip_suffix('Z')
        .or_else(|| text.strip_suffix('z'))
        .map(|rest| format!("{rest}+00:00"));
    let candidate = zulu_normalized.as_deref().unwrap_or(text);

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(candidate, format) {
            return Some(dt.naive_local());
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    if let Some(dt) = parse_date_hour(text) {
        return Some(dt);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// `YYYY-MM-DD hh` or `YYYY-MM-DDThh`, at the start of the hour
fn parse_date_hour(text: &str) -> Option<NaiveDateTime> {
    let (date, hour) = text.split_once(['T', ' '])?;
    if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    date.and_hms_opt(hour.parse().ok()?, 0, 0)
}
