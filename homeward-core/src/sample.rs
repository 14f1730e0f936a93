//! Input samples and the navigation target
//!
//! These are the raw readings the host feeds into the engine. They are plain
//! `Copy`/`Clone` values; the engine never mutates a sample it was given.

use serde::{Deserialize, Serialize};

use crate::geo::{bearing_between, haversine_distance};

/// One raw position fix from the location provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    #[serde(default)]
    pub altitude: f64,
    /// Horizontal accuracy radius in meters (negative = invalid fix)
    pub horizontal_accuracy: f64,
    /// Ground speed in m/s (negative = unknown)
    #[serde(default = "unknown")]
    pub speed: f64,
    /// Course over ground in degrees from north (negative = unknown)
    #[serde(default = "unknown")]
    pub course: f64,
    /// Unix timestamp (ms) of the fix
    pub timestamp: u64,
}

fn unknown() -> f64 {
    -1.0
}

impl PositionSample {
    /// Create a fix with unknown speed and course
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy: f64, timestamp: u64) -> Self {
        PositionSample {
            latitude,
            longitude,
            altitude: 0.0,
            horizontal_accuracy,
            speed: -1.0,
            course: -1.0,
            timestamp,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_course(mut self, course: f64) -> Self {
        self.course = course;
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// A fix with a negative accuracy radius carries no usable position
    pub fn is_valid(&self) -> bool {
        self.horizontal_accuracy >= 0.0
    }

    /// Great-circle distance to another fix, in meters
    pub fn distance_to(&self, other: &PositionSample) -> f64 {
        haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    /// Bearing from this fix to another, degrees clockwise from north
    pub fn bearing_to(&self, other: &PositionSample) -> f64 {
        bearing_between(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    /// Milliseconds elapsed between the fix and `now_ms` (0 if the fix is in the future)
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }
}

/// One compass reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingSample {
    /// True heading in degrees [0, 360)
    pub true_heading: f64,
    /// Unix timestamp (ms)
    pub timestamp: u64,
}

impl HeadingSample {
    pub fn new(true_heading: f64, timestamp: u64) -> Self {
        HeadingSample {
            true_heading,
            timestamp,
        }
    }
}

/// Destination the engine navigates toward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Display name, carried through to alerts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TargetPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        TargetPoint {
            latitude,
            longitude,
            name: None,
        }
    }

    pub fn named(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        TargetPoint {
            latitude,
            longitude,
            name: Some(name.into()),
        }
    }

    /// Distance from a fix to this target, in meters
    pub fn distance_from(&self, sample: &PositionSample) -> f64 {
        haversine_distance(
            sample.latitude,
            sample.longitude,
            self.latitude,
            self.longitude,
        )
    }

    /// Bearing from a fix to this target
    pub fn bearing_from(&self, sample: &PositionSample) -> f64 {
        bearing_between(
            sample.latitude,
            sample.longitude,
            self.latitude,
            self.longitude,
        )
    }
}
