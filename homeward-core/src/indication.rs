//! Indication: one derived navigation snapshot
//!
//! An [`Indication`] is built by [`IndicationBuilder`] from the current fix,
//! the optional target and the previous delivered indication. It is immutable
//! apart from the ETA, which the engine attaches at most once afterwards
//! because it depends on session state the builder does not own.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::buffers::StatBuffer;
use crate::sample::{PositionSample, TargetPoint};
use crate::tiers::AccuracyTier;

/// Distance reported while navigating toward north
pub const COMPASS_DISTANCE: f64 = -1.0;

/// Below this speed (m/s) motion-derived values are unreliable
pub const TOO_SLOW_SPEED: f64 = 0.5;

/// Derived navigation state for one accepted fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indication {
    position: PositionSample,
    target: Option<TargetPoint>,
    distance: f64,
    speed: f64,
    bearing_to_target: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    course: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bearing_error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smoothed_bearing_error: Option<f64>,
    accuracy_tier: AccuracyTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    eta: Option<f64>,
}

impl Indication {
    /// The fix this indication was built from
    pub fn position(&self) -> &PositionSample {
        &self.position
    }

    /// Destination, `None` in compass mode
    pub fn target(&self) -> Option<&TargetPoint> {
        self.target.as_ref()
    }

    /// Meters to the target, [`COMPASS_DISTANCE`] in compass mode
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Speed in m/s (negative when unknown)
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Direct bearing to the target; 0 (north) in compass mode
    pub fn bearing_to_target(&self) -> f64 {
        self.bearing_to_target
    }

    pub fn course(&self) -> Option<f64> {
        self.course
    }

    /// Bearing to target minus course
    pub fn bearing_error(&self) -> Option<f64> {
        self.bearing_error
    }

    /// Circular mean of the recent bearing errors
    pub fn smoothed_bearing_error(&self) -> Option<f64> {
        self.smoothed_bearing_error
    }

    /// Horizontal accuracy radius of the fix, in meters
    pub fn accuracy(&self) -> f64 {
        self.position.horizontal_accuracy
    }

    pub fn accuracy_tier(&self) -> AccuracyTier {
        self.accuracy_tier
    }

    /// Estimated seconds to the alert radius
    pub fn eta(&self) -> Option<f64> {
        self.eta
    }

    pub fn timestamp(&self) -> u64 {
        self.position.timestamp
    }

    pub fn is_compass_mode(&self) -> bool {
        self.target.is_none()
    }

    /// Attach an ETA. Ignored in compass mode or if one is already attached.
    pub fn with_eta(mut self, eta: Option<f64>) -> Self {
        if self.eta.is_none() && !self.is_compass_mode() {
            self.eta = eta;
        }
        self
    }

    /// Distance left before the alert radius is reached, never negative
    pub fn relative_distance(&self, alert_radius: f64) -> f64 {
        (self.distance - alert_radius).max(0.0)
    }

    /// Distance minus own accuracy minus the alert radius.
    ///
    /// Negative when the accuracy circle overlaps the alert radius.
    pub fn minimum_distance(&self, alert_radius: f64) -> f64 {
        self.distance - self.accuracy() - alert_radius
    }

    pub fn is_too_slow(&self) -> bool {
        self.speed < TOO_SLOW_SPEED
    }

    /// Both tiers usable and radii within `tolerance` meters
    pub fn similar_accuracy(&self, other: &Indication, tolerance: f64) -> bool {
        similar_accuracy(self.accuracy(), other.accuracy(), tolerance)
    }
}

/// Strict accuracy compatibility; Low tier never matches
pub(crate) fn similar_accuracy(a: f64, b: f64, tolerance: f64) -> bool {
    match (AccuracyTier::from_accuracy(a), AccuracyTier::from_accuracy(b)) {
        (Some(ta), Some(tb)) if ta != AccuracyTier::Low && tb != AccuracyTier::Low => {
            (a - b).abs() <= tolerance
        }
        _ => false,
    }
}

/// Builds [`Indication`]s from raw fixes
#[derive(Debug, Clone, Copy)]
pub struct IndicationBuilder {
    /// Tolerance for the strict similar-accuracy test, meters
    pub max_accuracy_difference: f64,
    /// Minimum speed (m/s) for deriving a course from consecutive fixes
    pub min_course_speed: f64,
}

impl Default for IndicationBuilder {
    fn default() -> Self {
        IndicationBuilder {
            max_accuracy_difference: 10.0,
            min_course_speed: 0.4,
        }
    }
}

impl IndicationBuilder {
    pub fn new(max_accuracy_difference: f64, min_course_speed: f64) -> Self {
        IndicationBuilder {
            max_accuracy_difference,
            min_course_speed,
        }
    }

    /// Build an indication, pushing any bearing error into `bearing_buffer`.
    ///
    /// Returns `None` for a fix with a negative accuracy radius.
    pub fn build(
        &self,
        sample: &PositionSample,
        target: Option<&TargetPoint>,
        previous: Option<&Indication>,
        bearing_buffer: &mut StatBuffer,
    ) -> Option<Indication> {
        let accuracy_tier = AccuracyTier::from_accuracy(sample.horizontal_accuracy)?;

        let (distance, bearing_to_target) = match target {
            Some(t) => (t.distance_from(sample), t.bearing_from(sample)),
            None => (COMPASS_DISTANCE, 0.0),
        };

        // Previous fix usable for deriving motion
        let comparable = previous.filter(|p| {
            similar_accuracy(
                sample.horizontal_accuracy,
                p.accuracy(),
                self.max_accuracy_difference,
            )
        });

        let speed = if sample.speed > 0.0 {
            sample.speed
        } else {
            comparable
                .and_then(|p| derived_speed(p.position(), sample))
                .unwrap_or(sample.speed)
        };

        let course = if sample.course > 0.0 {
            Some(sample.course)
        } else if speed >= self.min_course_speed {
            comparable.map(|p| p.position().bearing_to(sample))
        } else {
            None
        };

        let bearing_error = course.map(|c| bearing_to_target - c);
        if let Some(err) = bearing_error {
            if accuracy_tier != AccuracyTier::Low {
                bearing_buffer.push(err);
            }
        }

        trace!(
            "indication: distance {:.1} m, bearing {:.1}, speed {:.2}, course {:?}, tier {:?}",
            distance,
            bearing_to_target,
            speed,
            course,
            accuracy_tier
        );

        Some(Indication {
            position: *sample,
            target: target.cloned(),
            distance,
            speed,
            bearing_to_target,
            course,
            bearing_error,
            smoothed_bearing_error: bearing_buffer.angle_mean(),
            accuracy_tier,
            eta: None,
        })
    }
}

/// Speed between two fixes, `None` unless time moved forward
fn derived_speed(from: &PositionSample, to: &PositionSample) -> Option<f64> {
    let dt_ms = to.timestamp.checked_sub(from.timestamp).filter(|dt| *dt > 0)?;
    Some(from.distance_to(to) / (dt_ms as f64 / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1e-4 degree of latitude is ~11.1 m
    fn fix(lat: f64, accuracy: f64, ts: u64) -> PositionSample {
        PositionSample::new(lat, 7.0, accuracy, ts)
    }

    fn target() -> TargetPoint {
        TargetPoint::new(45.01, 7.0)
    }

    #[test]
    fn test_invalid_sample_fails() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        assert!(b
            .build(&fix(45.0, -1.0, 0), Some(&target()), None, &mut buf)
            .is_none());
    }

    #[test]
    fn test_compass_mode() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let ind = b.build(&fix(45.0, 5.0, 0), None, None, &mut buf).unwrap();
        assert_eq!(ind.distance(), COMPASS_DISTANCE);
        assert_eq!(ind.bearing_to_target(), 0.0);
        assert!(ind.is_compass_mode());
        // ETA never attaches in compass mode
        assert_eq!(ind.with_eta(Some(10.0)).eta(), None);
    }

    #[test]
    fn test_target_distance_and_bearing() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let ind = b
            .build(&fix(45.0, 5.0, 0), Some(&target()), None, &mut buf)
            .unwrap();
        assert!((ind.distance() - 1111.95).abs() < 1.0);
        assert!(ind.bearing_to_target().abs() < 1e-9);
        assert_eq!(ind.accuracy_tier(), AccuracyTier::Good);
        assert_eq!(ind.course(), None);
        assert_eq!(ind.smoothed_bearing_error(), None);
    }

    #[test]
    fn test_reported_speed_and_course_preferred() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let s = fix(45.0, 5.0, 0).with_speed(1.5).with_course(10.0);
        let ind = b.build(&s, Some(&target()), None, &mut buf).unwrap();
        assert_eq!(ind.speed(), 1.5);
        assert_eq!(ind.course(), Some(10.0));
        assert!((ind.bearing_error().unwrap() + 10.0).abs() < 1e-9);
        assert_eq!(buf.len(), 1);
        assert!((ind.smoothed_bearing_error().unwrap() + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_derived_speed_and_course() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let first = b
            .build(&fix(45.0, 5.0, 0), Some(&target()), None, &mut buf)
            .unwrap();
        let second = b
            .build(
                &fix(45.0001, 8.0, 10_000),
                Some(&target()),
                Some(&first),
                &mut buf,
            )
            .unwrap();
        assert!((second.speed() - 1.112).abs() < 0.01, "{}", second.speed());
        let course = second.course().unwrap();
        assert!(course.abs() < 1e-6 || (course - 360.0).abs() < 1e-6);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_dissimilar_accuracy_keeps_unknown_motion() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let first = b
            .build(&fix(45.0, 5.0, 0), Some(&target()), None, &mut buf)
            .unwrap();
        let second = b
            .build(
                &fix(45.0001, 30.0, 10_000),
                Some(&target()),
                Some(&first),
                &mut buf,
            )
            .unwrap();
        assert_eq!(second.speed(), -1.0);
        assert_eq!(second.course(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_low_tier_does_not_feed_bearing_buffer() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let s = fix(45.0, 80.0, 0).with_course(30.0);
        let ind = b.build(&s, Some(&target()), None, &mut buf).unwrap();
        assert_eq!(ind.accuracy_tier(), AccuracyTier::Low);
        assert_eq!(ind.course(), Some(30.0));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_slow_motion_gives_no_course() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let first = b
            .build(&fix(45.0, 5.0, 0), Some(&target()), None, &mut buf)
            .unwrap();
        // ~1.1 m in 10 s
        let second = b
            .build(
                &fix(45.00001, 5.0, 10_000),
                Some(&target()),
                Some(&first),
                &mut buf,
            )
            .unwrap();
        assert!(second.speed() < 0.4);
        assert_eq!(second.course(), None);
        assert!(second.is_too_slow());
    }

    #[test]
    fn test_similar_accuracy_rules() {
        assert!(similar_accuracy(5.0, 15.0, 10.0));
        assert!(!similar_accuracy(5.0, 15.1, 10.0));
        assert!(!similar_accuracy(66.0, 66.0, 10.0));
        assert!(!similar_accuracy(-1.0, 5.0, 10.0));
    }

    #[test]
    fn test_relative_and_minimum_distance() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let ind = b
            .build(&fix(45.0, 10.0, 0), Some(&target()), None, &mut buf)
            .unwrap();
        let d = ind.distance();
        assert!((ind.relative_distance(100.0) - (d - 100.0)).abs() < 1e-9);
        assert_eq!(ind.relative_distance(5000.0), 0.0);
        assert!((ind.minimum_distance(100.0) - (d - 110.0)).abs() < 1e-9);
    }

    #[test]
    fn test_eta_attaches_once() {
        let b = IndicationBuilder::default();
        let mut buf = StatBuffer::new(4);
        let ind = b
            .build(&fix(45.0, 10.0, 0), Some(&target()), None, &mut buf)
            .unwrap()
            .with_eta(Some(120.0))
            .with_eta(Some(60.0));
        assert_eq!(ind.eta(), Some(120.0));
    }
}
