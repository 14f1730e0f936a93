//! Geodesy helpers
//!
//! Distances use the haversine formula on a spherical earth. Bearings use an
//! equirectangular approximation with a latitude-cosine correction, which is
//! accurate enough at the scales a pedestrian or cyclist navigates.

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates, in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Bearing from one coordinate to another.
///
/// Degrees from north, increasing clockwise, in `[0, 360)`.
pub fn bearing_between(from_lat: f64, from_lon: f64, to_lat: f64, to_lon: f64) -> f64 {
    let dy = to_lat - from_lat;
    let dx = from_lat.to_radians().cos() * (to_lon - from_lon);
    // atan2 is counter-clockwise from east; rebase to clockwise from north
    normalize_bearing(90.0 - dy.atan2(dx).to_degrees())
}

/// Normalize bearing to 0-360 range
pub fn normalize_bearing(bearing: f64) -> f64 {
    let mut b = bearing % 360.0;
    if b < 0.0 {
        b += 360.0;
    }
    b
}

/// The eight principal compass points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    /// Map a course (degrees from north) to its compass point.
    ///
    /// Each point covers a 45 degree sector centred on it; the upper edge of a
    /// sector belongs to it. Returns `None` outside of `[0, 360]`.
    pub fn from_course(course: f64) -> Option<Self> {
        if !(0.0..=360.0).contains(&course) {
            return None;
        }
        let point = if course <= 22.5 {
            CompassPoint::N
        } else if course <= 67.5 {
            CompassPoint::NE
        } else if course <= 112.5 {
            CompassPoint::E
        } else if course <= 157.5 {
            CompassPoint::SE
        } else if course <= 202.5 {
            CompassPoint::S
        } else if course <= 247.5 {
            CompassPoint::SW
        } else if course <= 292.5 {
            CompassPoint::W
        } else if course <= 337.5 {
            CompassPoint::NW
        } else {
            CompassPoint::N
        };
        Some(point)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NE => "NE",
            CompassPoint::E => "E",
            CompassPoint::SE => "SE",
            CompassPoint::S => "S",
            CompassPoint::SW => "SW",
            CompassPoint::W => "W",
            CompassPoint::NW => "NW",
        }
    }
}

impl std::fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
