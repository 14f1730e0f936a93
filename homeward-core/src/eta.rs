//! ETA estimation
//!
//! The ETA is the time left until the user reaches the alert radius around
//! the destination. Closing speeds between consecutive delivered indications
//! go into a long speed buffer; the estimate divides the remaining relative
//! distance by the recency-weighted mean of that buffer.
//!
//! Two compatibility policies decide whether a pair of indications is
//! trustworthy enough to produce a closing speed:
//!
//! - normal mode: both tiers usable and radii within an absolute tolerance
//! - relaxed mode: radii within a proportion of their mean

use log::trace;

use crate::buffers::StatBuffer;
use crate::indication::{similar_accuracy, Indication};

/// `|a - b|` is strictly below `p` times the mean of `a` and `b`
pub fn within_proportion(a: f64, b: f64, p: f64) -> bool {
    (a - b).abs() < (a + b) / 2.0 * p
}

/// Session-scoped ETA state
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    speeds: StatBuffer,
    max_accuracy_difference: f64,
    relaxed_tolerance: f64,
    max_eta: f64,
}

impl EtaEstimator {
    pub fn new(
        buffer_size: usize,
        max_accuracy_difference: f64,
        relaxed_tolerance: f64,
        max_eta: f64,
    ) -> Self {
        EtaEstimator {
            speeds: StatBuffer::new(buffer_size),
            max_accuracy_difference,
            relaxed_tolerance,
            max_eta,
        }
    }

    /// Closing-speed samples collected so far
    pub fn speeds(&self) -> &StatBuffer {
        &self.speeds
    }

    pub fn reset(&mut self) {
        self.speeds.clear();
    }

    /// Estimate seconds until `current` reaches the alert radius.
    ///
    /// Pushes one closing-speed sample whenever the pair is compatible and
    /// time moved forward, even if no estimate results.
    pub fn estimate(
        &mut self,
        current: &Indication,
        previous: &Indication,
        relaxed: bool,
        alert_radius: f64,
    ) -> Option<f64> {
        if current.distance() < 0.0 || previous.distance() < 0.0 {
            return None;
        }

        let compatible = if relaxed {
            within_proportion(
                current.accuracy(),
                previous.accuracy(),
                self.relaxed_tolerance,
            )
        } else {
            similar_accuracy(
                current.accuracy(),
                previous.accuracy(),
                self.max_accuracy_difference,
            )
        };
        if !compatible {
            trace!("eta: accuracies not compatible (relaxed: {})", relaxed);
            return None;
        }

        let dt_ms = current.timestamp().checked_sub(previous.timestamp())?;
        if dt_ms == 0 {
            return None;
        }
        let dt = dt_ms as f64 / 1000.0;

        let remaining = current.relative_distance(alert_radius);
        let closing = (previous.relative_distance(alert_radius) - remaining) / dt;
        self.speeds.push(closing);

        let weighted = self.speeds.weighted_mean().filter(|w| *w > 0.0)?;
        let estimate = remaining / weighted;
        trace!(
            "eta: closing {:.2} m/s, weighted {:.2} m/s, estimate {:.0} s",
            closing,
            weighted,
            estimate
        );

        if estimate >= 0.0 && estimate < self.max_eta {
            Some(estimate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indication::IndicationBuilder;
    use crate::sample::{PositionSample, TargetPoint};

    const ONE_METER_LAT: f64 = 1.0 / 111_195.0;

    fn indication(meters_south: f64, accuracy: f64, ts: u64, target: Option<&TargetPoint>) -> Indication {
        let mut buf = StatBuffer::new(4);
        let sample = PositionSample::new(45.0 - meters_south * ONE_METER_LAT, 7.0, accuracy, ts);
        IndicationBuilder::default()
            .build(&sample, target, None, &mut buf)
            .unwrap()
    }

    fn estimator() -> EtaEstimator {
        EtaEstimator::new(120, 10.0, 0.1, 86_400.0)
    }

    #[test]
    fn test_within_proportion() {
        assert!(within_proportion(100.0, 105.0, 0.1));
        assert!(!within_proportion(100.0, 120.0, 0.1));
        // strict bound
        assert!(!within_proportion(95.0, 105.0, 0.1));
    }

    #[test]
    fn test_needs_two_speed_samples() {
        let t = TargetPoint::new(45.0, 7.0);
        let mut eta = estimator();
        let a = indication(1000.0, 10.0, 0, Some(&t));
        let b = indication(950.0, 10.0, 10_000, Some(&t));
        let c = indication(900.0, 10.0, 20_000, Some(&t));
        assert_eq!(eta.estimate(&b, &a, false, 0.0), None);
        let e = eta.estimate(&c, &b, false, 0.0).unwrap();
        // 900 m at 5 m/s
        assert!((e - 180.0).abs() < 1.0, "got {}", e);
    }

    #[test]
    fn test_alert_radius_is_subtracted() {
        let t = TargetPoint::new(45.0, 7.0);
        let mut eta = estimator();
        let a = indication(1000.0, 10.0, 0, Some(&t));
        let b = indication(950.0, 10.0, 10_000, Some(&t));
        let c = indication(900.0, 10.0, 20_000, Some(&t));
        eta.estimate(&b, &a, false, 100.0);
        let e = eta.estimate(&c, &b, false, 100.0).unwrap();
        assert!((e - 160.0).abs() < 1.0, "got {}", e);
    }

    #[test]
    fn test_moving_away_gives_no_eta() {
        let t = TargetPoint::new(45.0, 7.0);
        let mut eta = estimator();
        let a = indication(900.0, 10.0, 0, Some(&t));
        let b = indication(950.0, 10.0, 10_000, Some(&t));
        let c = indication(1000.0, 10.0, 20_000, Some(&t));
        eta.estimate(&b, &a, false, 0.0);
        assert_eq!(eta.estimate(&c, &b, false, 0.0), None);
        assert_eq!(eta.speeds().len(), 2);
    }

    #[test]
    fn test_compass_mode_gives_no_eta() {
        let mut eta = estimator();
        let a = indication(1000.0, 10.0, 0, None);
        let b = indication(950.0, 10.0, 10_000, None);
        assert_eq!(eta.estimate(&b, &a, false, 0.0), None);
        assert!(eta.speeds().is_empty());
    }

    #[test]
    fn test_compatibility_policies() {
        let t = TargetPoint::new(45.0, 7.0);
        // Low tier fails the strict test but is within 10% of the mean
        let a = indication(1000.0, 70.0, 0, Some(&t));
        let b = indication(950.0, 75.0, 10_000, Some(&t));

        let mut strict = estimator();
        assert_eq!(strict.estimate(&b, &a, false, 0.0), None);
        assert!(strict.speeds().is_empty());

        let mut relaxed = estimator();
        relaxed.estimate(&b, &a, true, 0.0);
        assert_eq!(relaxed.speeds().len(), 1);
    }

    #[test]
    fn test_estimate_is_bounded() {
        let t = TargetPoint::new(45.0, 7.0);
        let mut eta = EtaEstimator::new(120, 10.0, 0.1, 100.0);
        let a = indication(1000.0, 10.0, 0, Some(&t));
        let b = indication(990.0, 10.0, 10_000, Some(&t));
        let c = indication(980.0, 10.0, 20_000, Some(&t));
        eta.estimate(&b, &a, false, 0.0);
        // 980 s exceeds the 100 s bound
        assert_eq!(eta.estimate(&c, &b, false, 0.0), None);
    }

    #[test]
    fn test_zero_time_delta_is_skipped() {
        let t = TargetPoint::new(45.0, 7.0);
        let mut eta = estimator();
        let a = indication(1000.0, 10.0, 5_000, Some(&t));
        let b = indication(950.0, 10.0, 5_000, Some(&t));
        assert_eq!(eta.estimate(&b, &a, false, 0.0), None);
        assert!(eta.speeds().is_empty());
    }
}
