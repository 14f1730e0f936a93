//! Engine configuration
//!
//! A single [`TrackingConfig`] value is handed to the engine at construction
//! and replaced wholesale through `update_config`. Durations are seconds,
//! distances meters. JSON uses camelCase keys and every field is optional.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tiers::UnitSystem;

/// Proximity and ETA alert preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertSettings {
    /// Master switch for both alerts
    pub enabled: bool,
    /// Proximity alert radius in meters
    pub proximity_radius: f64,
    /// ETA alert threshold in seconds (0 = off)
    pub eta_threshold: f64,
    /// Whether tracking should stop once the proximity alert fires
    pub stop_on_proximity: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        AlertSettings {
            enabled: false,
            proximity_radius: 100.0,
            eta_threshold: 0.0,
            stop_on_proximity: true,
        }
    }
}

impl AlertSettings {
    /// Radius subtracted from distances: the proximity radius when alerts are on, else 0
    pub fn effective_radius(&self) -> f64 {
        if self.enabled {
            self.proximity_radius
        } else {
            0.0
        }
    }
}

/// All tunables of the tracking engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingConfig {
    pub alerts: AlertSettings,
    /// Allow accuracy relaxation when the host goes to background
    pub battery_saving: bool,
    /// Use compass headings; standing still then keeps indications flowing
    pub heading_enabled: bool,
    pub units: UnitSystem,

    /// Fixes to discard before the first indication
    pub min_updates_before_indications: u32,
    /// Closing-speed samples kept for ETA
    pub speed_buffer_size: usize,
    /// Bearing errors kept for smoothing
    pub bearing_buffer_size: usize,

    /// Standing-still window, seconds
    pub standing_still_window: f64,
    /// Max spread of fixes while standing still, meters
    pub standing_still_distance: f64,
    /// Age after which a fix counts as signal loss, seconds
    pub signal_lost_duration: f64,
    /// Period of the host's signal-loss check, seconds
    pub signal_check_interval: f64,
    /// Delay between engaging and activating relaxation, seconds
    pub relax_enable_delay: f64,
    /// Max time without an indication under poor accuracy, seconds
    pub good_accuracy_grace: f64,
    /// Strict similar-accuracy tolerance, meters
    pub max_accuracy_difference: f64,
    /// Proportional accuracy tolerance in relaxed mode
    pub relaxed_eta_tolerance: f64,
    /// Minimum speed for deriving a course, m/s
    pub min_course_speed: f64,
    /// Estimates at or beyond this are dropped, seconds
    pub max_eta: f64,
    /// Time before a fired ETA alert may re-arm, seconds.
    ///
    /// Exclusive: re-arming needs strictly more than this since the alert.
    pub eta_alert_rearm_delay: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            alerts: AlertSettings::default(),
            battery_saving: false,
            heading_enabled: false,
            units: UnitSystem::Metric,
            min_updates_before_indications: 5,
            speed_buffer_size: 120,
            bearing_buffer_size: 4,
            standing_still_window: 30.0,
            standing_still_distance: 10.0,
            signal_lost_duration: 20.0,
            signal_check_interval: 2.5,
            relax_enable_delay: 120.0,
            good_accuracy_grace: 7.5,
            max_accuracy_difference: 10.0,
            relaxed_eta_tolerance: 0.1,
            min_course_speed: 0.4,
            max_eta: 24.0 * 60.0 * 60.0,
            eta_alert_rearm_delay: 60.0,
        }
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

impl TrackingConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TrackingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_updates_before_indications == 0 {
            return Err(ConfigError::Zero {
                field: "minUpdatesBeforeIndications",
            });
        }
        if self.speed_buffer_size == 0 {
            return Err(ConfigError::Zero {
                field: "speedBufferSize",
            });
        }
        if self.bearing_buffer_size == 0 {
            return Err(ConfigError::Zero {
                field: "bearingBufferSize",
            });
        }

        let non_negative = [
            ("alerts.proximityRadius", self.alerts.proximity_radius),
            ("alerts.etaThreshold", self.alerts.eta_threshold),
            ("standingStillWindow", self.standing_still_window),
            ("standingStillDistance", self.standing_still_distance),
            ("signalLostDuration", self.signal_lost_duration),
            ("relaxEnableDelay", self.relax_enable_delay),
            ("goodAccuracyGrace", self.good_accuracy_grace),
            ("maxAccuracyDifference", self.max_accuracy_difference),
            ("minCourseSpeed", self.min_course_speed),
            ("maxEta", self.max_eta),
            ("etaAlertRearmDelay", self.eta_alert_rearm_delay),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if !self.signal_check_interval.is_finite() || self.signal_check_interval <= 0.0 {
            return Err(ConfigError::Zero {
                field: "signalCheckInterval",
            });
        }

        let tol = self.relaxed_eta_tolerance;
        if !(tol > 0.0 && tol <= 1.0) {
            return Err(ConfigError::InvalidTolerance(tol));
        }
        Ok(())
    }

    pub fn standing_still_window_ms(&self) -> u64 {
        secs_to_ms(self.standing_still_window)
    }

    pub fn signal_lost_ms(&self) -> u64 {
        secs_to_ms(self.signal_lost_duration)
    }

    pub fn signal_check_interval_ms(&self) -> u64 {
        secs_to_ms(self.signal_check_interval)
    }

    pub fn relax_enable_delay_ms(&self) -> u64 {
        secs_to_ms(self.relax_enable_delay)
    }

    pub fn good_accuracy_grace_ms(&self) -> u64 {
        secs_to_ms(self.good_accuracy_grace)
    }

    pub fn eta_alert_rearm_ms(&self) -> u64 {
        secs_to_ms(self.eta_alert_rearm_delay)
    }
}
