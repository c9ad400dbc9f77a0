//! Geodesic distance between customer and merchant locations.
//!
//! Distances are measured on the WGS-84 ellipsoid with Karney's inverse
//! solution, which converges for every pair of points including nearly
//! antipodal ones.

use geographiclib_rs::{Geodesic, InverseGeodesic};
use std::sync::OnceLock;

/// A (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

fn wgs84() -> &'static Geodesic {
    static WGS84: OnceLock<Geodesic> = OnceLock::new();
    WGS84.get_or_init(Geodesic::wgs84)
}

/// Geodesic distance in kilometers between two points.
///
/// Coordinates are not range-checked. Longitudes wrap; a latitude outside
/// [-90, 90] or any non-finite input yields NaN.
pub fn geodesic_km(from: Coordinates, to: Coordinates) -> f64 {
    let meters: f64 = wgs84().inverse(from.lat, from.lon, to.lat, to.lon);
    meters / 1000.0
}
