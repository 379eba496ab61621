// src/features/mod.rs
// Deterministic transform from a validated trip to the model's feature vector

pub mod holidays;
pub mod projection;

use chrono::{Datelike, NaiveTime, Timelike};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::ops::Index;

use crate::trip::ValidatedTripRequest;

pub const FEATURE_COUNT: usize = 12;

/// Model input columns. Declaration order is the column order of the trained artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    PickupLongitude,
    PickupLatitude,
    DropoffLongitude,
    DropoffLatitude,
    PassengerCount,
    Year,
    Month,
    Day,
    Hour,
    DistanceKm,
    IsHoliday,
    IsWeekend,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::PickupLongitude,
        Feature::PickupLatitude,
        Feature::DropoffLongitude,
        Feature::DropoffLatitude,
        Feature::PassengerCount,
        Feature::Year,
        Feature::Month,
        Feature::Day,
        Feature::Hour,
        Feature::DistanceKm,
        Feature::IsHoliday,
        Feature::IsWeekend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::PickupLongitude => "pickup_longitude",
            Feature::PickupLatitude => "pickup_latitude",
            Feature::DropoffLongitude => "dropoff_longitude",
            Feature::DropoffLatitude => "dropoff_latitude",
            Feature::PassengerCount => "passenger_count",
            Feature::Year => "year",
            Feature::Month => "month",
            Feature::Day => "day",
            Feature::Hour => "hour",
            Feature::DistanceKm => "distance_km",
            Feature::IsHoliday => "is_holiday",
            Feature::IsWeekend => "is_weekend",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Named numeric features in model column order. Flags are encoded as 0.0 / 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL.into_iter().zip(self.values.iter().copied())
    }

    pub fn distance_km(&self) -> f64 {
        self[Feature::DistanceKm]
    }

    pub fn is_holiday(&self) -> bool {
        self[Feature::IsHoliday] != 0.0
    }

    pub fn is_weekend(&self) -> bool {
        self[Feature::IsWeekend] != 0.0
    }
}

impl Index<Feature> for FeatureVector {
    type Output = f64;

    fn index(&self, feature: Feature) -> &f64 {
        &self.values[feature.index()]
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (feature, value) in self.iter() {
            map.serialize_entry(feature.name(), &value)?;
        }
        map.end()
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Build the model input for one trip.
///
/// Calendar features come from the pickup date truncated to midnight, so `hour`
/// is always zero. The model was fit on features derived this way.
pub fn derive_features(trip: &ValidatedTripRequest) -> FeatureVector {
    let pickup = trip.pickup();
    let dropoff = trip.dropoff();
    let distance_km = projection::planar_distance_km(pickup, dropoff);

    let date = trip.pickup_datetime().date();
    let truncated = date.and_time(NaiveTime::MIN);
    let is_holiday = holidays::is_us_holiday(date);
    let is_weekend = date.weekday().num_days_from_monday() > 4;

    let mut values = [0.0; FEATURE_COUNT];
    values[Feature::PickupLongitude.index()] = pickup.longitude;
    values[Feature::PickupLatitude.index()] = pickup.latitude;
    values[Feature::DropoffLongitude.index()] = dropoff.longitude;
    values[Feature::DropoffLatitude.index()] = dropoff.latitude;
    values[Feature::PassengerCount.index()] = f64::from(trip.passenger_count());
    values[Feature::Year.index()] = f64::from(truncated.year());
    values[Feature::Month.index()] = f64::from(truncated.month());
    values[Feature::Day.index()] = f64::from(truncated.day());
    values[Feature::Hour.index()] = f64::from(truncated.hour());
    values[Feature::DistanceKm.index()] = distance_km;
    values[Feature::IsHoliday.index()] = flag(is_holiday);
    values[Feature::IsWeekend.index()] = flag(is_weekend);

    FeatureVector { values }
}
