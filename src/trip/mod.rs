// src/trip/mod.rs
// Trip aggregates and the final schema check applied once every field is collected

use chrono::{Datelike, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::intake::validators::{pickup_year_allowed, MAX_YEARS_AHEAD, MIN_PICKUP_YEAR};

/// Full geographic latitude range
pub const SCHEMA_LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Full geographic longitude range
pub const SCHEMA_LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Passenger counts the model accepts
pub const SCHEMA_PASSENGER_RANGE: RangeInclusive<u32> = 1..=8;

/// Degrees within which pickup and dropoff count as the same place
pub const SAME_POINT_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Trip fields collected so far in one conversation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialTripInput {
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    pub dropoff_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
    pub passenger_count: Option<u32>,
    pub pickup_datetime: Option<NaiveDateTime>,
}

impl PartialTripInput {
    pub fn with_pickup(mut self, point: GeoPoint) -> Self {
        self.pickup_latitude = Some(point.latitude);
        self.pickup_longitude = Some(point.longitude);
        self
    }

    pub fn with_dropoff(mut self, point: GeoPoint) -> Self {
        self.dropoff_latitude = Some(point.latitude);
        self.dropoff_longitude = Some(point.longitude);
        self
    }

    pub fn with_passengers(mut self, count: u32) -> Self {
        self.passenger_count = Some(count);
        self
    }

    pub fn with_pickup_datetime(mut self, datetime: NaiveDateTime) -> Self {
        self.pickup_datetime = Some(datetime);
        self
    }

    /// Run the schema check over the collected fields.
    pub fn validate(&self) -> Result<ValidatedTripRequest, SchemaErrors> {
        ValidatedTripRequest::try_from(*self)
    }
}

/// A trip that passed every schema rule. Only constructible through validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidatedTripRequest {
    pickup: GeoPoint,
    dropoff: GeoPoint,
    passenger_count: u32,
    pickup_datetime: NaiveDateTime,
}

impl ValidatedTripRequest {
    pub fn new(
        pickup: GeoPoint,
        dropoff: GeoPoint,
        passenger_count: u32,
        pickup_datetime: NaiveDateTime,
    ) -> Result<Self, SchemaErrors> {
        PartialTripInput::default()
            .with_pickup(pickup)
            .with_dropoff(dropoff)
            .with_passengers(passenger_count)
            .with_pickup_datetime(pickup_datetime)
            .validate()
    }

    pub fn pickup(&self) -> GeoPoint {
        self.pickup
    }

    pub fn dropoff(&self) -> GeoPoint {
        self.dropoff
    }

    pub fn passenger_count(&self) -> u32 {
        self.passenger_count
    }

    pub fn pickup_datetime(&self) -> NaiveDateTime {
        self.pickup_datetime
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    MissingField(&'static str),
    LatitudeOutOfRange { field: &'static str, value: f64 },
    LongitudeOutOfRange { field: &'static str, value: f64 },
    PassengerCountOutOfRange(u32),
    PickupYearOutOfRange(i32),
    SamePoint,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Field {field} is missing"),
            Self::LatitudeOutOfRange { field, value } => {
                write!(f, "Latitude must be within [-90, 90] ({field} = {value})")
            }
            Self::LongitudeOutOfRange { field, value } => {
                write!(f, "Longitude must be within [-180, 180] ({field} = {value})")
            }
            Self::PassengerCountOutOfRange(count) => write!(
                f,
                "Passenger count out of range: must be between 1 and 8, got {count}"
            ),
            Self::PickupYearOutOfRange(year) => write!(
                f,
                "Pickup year out of range: must be between {MIN_PICKUP_YEAR} and \
                 {MAX_YEARS_AHEAD} years from now, got {year}"
            ),
            Self::SamePoint => write!(
                f,
                "Dropoff is the same point as pickup, change the coordinates"
            ),
        }
    }
}

/// Every rule a trip broke, in check order
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaErrors(pub Vec<SchemaViolation>);

impl SchemaErrors {
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.0
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Errors found:")?;
        for violation in &self.0 {
            write!(f, "\n• {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

fn check_latitude(
    field: &'static str,
    value: Option<f64>,
    out: &mut Vec<SchemaViolation>,
) -> Option<f64> {
    match value {
        None => {
            out.push(SchemaViolation::MissingField(field));
            None
        }
        Some(value) if !SCHEMA_LATITUDE_RANGE.contains(&value) => {
            out.push(SchemaViolation::LatitudeOutOfRange { field, value });
            None
        }
        Some(value) => Some(value),
    }
}

fn check_longitude(
    field: &'static str,
    value: Option<f64>,
    out: &mut Vec<SchemaViolation>,
) -> Option<f64> {
    match value {
        None => {
            out.push(SchemaViolation::MissingField(field));
            None
        }
        Some(value) if !SCHEMA_LONGITUDE_RANGE.contains(&value) => {
            out.push(SchemaViolation::LongitudeOutOfRange { field, value });
            None
        }
        Some(value) => Some(value),
    }
}

impl TryFrom<PartialTripInput> for ValidatedTripRequest {
    type Error = SchemaErrors;

    fn try_from(input: PartialTripInput) -> Result<Self, Self::Error> {
        let mut violations = Vec::new();

        let out = &mut violations;
        let pickup_latitude = check_latitude("pickup_latitude", input.pickup_latitude, out);
        let pickup_longitude = check_longitude("pickup_longitude", input.pickup_longitude, out);
        let dropoff_latitude = check_latitude("dropoff_latitude", input.dropoff_latitude, out);
        let dropoff_longitude = check_longitude("dropoff_longitude", input.dropoff_longitude, out);

        let passenger_count = match input.passenger_count {
            None => {
                violations.push(SchemaViolation::MissingField("passenger_count"));
                None
            }
            Some(count) if !SCHEMA_PASSENGER_RANGE.contains(&count) => {
                violations.push(SchemaViolation::PassengerCountOutOfRange(count));
                None
            }
            Some(count) => Some(count),
        };

        let current_year = Local::now().year();
        let pickup_datetime = match input.pickup_datetime {
            None => {
                violations.push(SchemaViolation::MissingField("pickup_datetime"));
                None
            }
            Some(datetime) if !pickup_year_allowed(datetime.year(), current_year) => {
                violations.push(SchemaViolation::PickupYearOutOfRange(datetime.year()));
                None
            }
            Some(datetime) => Some(datetime),
        };

        // Compared on raw values so it is reported alongside range violations.
        if let (Some(plat), Some(plon), Some(dlat), Some(dlon)) = (
            input.pickup_latitude,
            input.pickup_longitude,
            input.dropoff_latitude,
            input.dropoff_longitude,
        ) {
            if (plat - dlat).abs() <= SAME_POINT_TOLERANCE
                && (plon - dlon).abs() <= SAME_POINT_TOLERANCE
            {
                violations.push(SchemaViolation::SamePoint);
            }
        }

        match (
            pickup_latitude,
            pickup_longitude,
            dropoff_latitude,
            dropoff_longitude,
            passenger_count,
            pickup_datetime,
        ) {
            (
                Some(plat),
                Some(plon),
                Some(dlat),
                Some(dlon),
                Some(passenger_count),
                Some(pickup_datetime),
            ) if violations.is_empty() => Ok(Self {
                pickup: GeoPoint { latitude: plat, longitude: plon },
                dropoff: GeoPoint { latitude: dlat, longitude: dlon },
                passenger_count,
                pickup_datetime,
            }),
            _ => Err(SchemaErrors(violations)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude }
    }

    #[test]
    fn test_valid_trip() {
        let trip = ValidatedTripRequest::new(
            point(40.712776, -74.005974),
            point(40.730610, -73.935242),
            2,
            at("2023-06-15 14:30:00"),
        )
        .unwrap();

        assert_eq!(trip.passenger_count(), 2);
        assert_eq!(trip.pickup().latitude, 40.712776);
        assert_eq!(trip.dropoff().longitude, -73.935242);
    }

    #[test]
    fn test_passenger_count_out_of_range() {
        let err = ValidatedTripRequest::new(
            point(40.7, -74.0),
            point(40.8, -73.9),
            9,
            at("2023-06-15 14:30:00"),
        )
        .unwrap_err();

        assert_eq!(err.violations(), &[SchemaViolation::PassengerCountOutOfRange(9)]);
        assert!(err.to_string().contains("Passenger count out of range"));

        let err = ValidatedTripRequest::new(
            point(40.7, -74.0),
            point(40.8, -73.9),
            0,
            at("2023-06-15 14:30:00"),
        )
        .unwrap_err();
        assert!(err.violations().contains(&SchemaViolation::PassengerCountOutOfRange(0)));
    }

    #[test]
    fn test_same_point_within_tolerance() {
        let err = ValidatedTripRequest::new(
            point(40.712776, -74.005974),
            point(40.712780, -74.005970),
            1,
            at("2023-06-15 14:30:00"),
        )
        .unwrap_err();

        assert_eq!(err.violations(), &[SchemaViolation::SamePoint]);
        assert!(err.to_string().contains("same point"));
    }

    #[test]
    fn test_one_axis_apart_is_not_same_point() {
        let trip = ValidatedTripRequest::new(
            point(40.712776, -74.005974),
            point(40.712776, -74.006974),
            1,
            at("2023-06-15 14:30:00"),
        );
        assert!(trip.is_ok());
    }

    #[test]
    fn test_violations_are_collected() {
        let input = PartialTripInput {
            pickup_latitude: Some(91.0),
            pickup_longitude: Some(-181.0),
            dropoff_latitude: Some(91.0),
            dropoff_longitude: Some(-181.0),
            passenger_count: Some(12),
            pickup_datetime: None,
        };

        let err = input.validate().unwrap_err();
        assert_eq!(
            err.violations(),
            &[
                SchemaViolation::LatitudeOutOfRange { field: "pickup_latitude", value: 91.0 },
                SchemaViolation::LongitudeOutOfRange { field: "pickup_longitude", value: -181.0 },
                SchemaViolation::LatitudeOutOfRange { field: "dropoff_latitude", value: 91.0 },
                SchemaViolation::LongitudeOutOfRange { field: "dropoff_longitude", value: -181.0 },
                SchemaViolation::PassengerCountOutOfRange(12),
                SchemaViolation::MissingField("pickup_datetime"),
                SchemaViolation::SamePoint,
            ]
        );

        let rendered = err.to_string();
        assert!(rendered.starts_with("Errors found:"));
        assert_eq!(rendered.matches('•').count(), 7);
    }

    #[test]
    fn test_pickup_year_outside_window() {
        let trip = |datetime: &str| {
            ValidatedTripRequest::new(point(40.7, -74.0), point(40.8, -73.9), 2, at(datetime))
        };

        let err = trip("1900-01-01 00:00:00").unwrap_err();
        assert_eq!(err.violations(), &[SchemaViolation::PickupYearOutOfRange(1900)]);
        assert!(err.to_string().contains("Pickup year out of range"));

        let err = trip("2008-12-31 23:59:59").unwrap_err();
        assert!(err.violations().contains(&SchemaViolation::PickupYearOutOfRange(2008)));

        let err = PartialTripInput::default()
            .with_pickup(point(40.7, -74.0))
            .with_dropoff(point(40.8, -73.9))
            .with_passengers(1)
            .with_pickup_datetime(at("2999-01-01 00:00:00"))
            .validate()
            .unwrap_err();
        assert_eq!(err.violations(), &[SchemaViolation::PickupYearOutOfRange(2999)]);

        let latest = Local::now().year() + MAX_YEARS_AHEAD;
        assert!(trip("2009-01-01 00:00:00").is_ok());
        assert!(trip(&format!("{latest}-12-31 23:00:00")).is_ok());
        assert!(trip(&format!("{}-01-01 00:00:00", latest + 1)).is_err());
    }

    #[test]
    fn test_missing_fields() {
        let err = PartialTripInput::default().validate().unwrap_err();
        assert_eq!(err.violations().len(), 6);
        assert!(err.violations().contains(&SchemaViolation::MissingField("passenger_count")));
    }
}
