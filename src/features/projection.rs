// src/features/projection.rs
// WGS84 -> Web Mercator (EPSG:3857) forward projection

use std::f64::consts::FRAC_PI_4;

use crate::trip::GeoPoint;

/// Semi-major axis of the WGS84 ellipsoid, used as the sphere radius by EPSG:3857
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Projected position in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub easting: f64,
    pub northing: f64,
}

pub fn to_web_mercator(point: GeoPoint) -> Projected {
    let lambda = point.longitude.to_radians();
    let phi = point.latitude.to_radians();
    Projected {
        easting: EARTH_RADIUS_M * lambda,
        northing: EARTH_RADIUS_M * (FRAC_PI_4 + phi / 2.0).tan().ln(),
    }
}

/// Straight-line distance between two points on the projected plane, in kilometres.
pub fn planar_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let a = to_web_mercator(a);
    let b = to_web_mercator(b);
    (b.easting - a.easting).hypot(b.northing - a.northing) / 1000.0
}
