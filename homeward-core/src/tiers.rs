//! Accuracy and distance classification
//!
//! [`AccuracyTier`] drives engine decisions (emission gate, bearing smoothing).
//! [`DistanceTier`] and the unit helpers only choose display rounding and must
//! never influence engine control flow.

use serde::{Deserialize, Serialize};

/// Radius at or below which a fix counts as Good
pub const GOOD_ACCURACY_MAX: f64 = 16.0;
/// Radius at or above which a fix counts as Low
pub const LOW_ACCURACY_MIN: f64 = 66.0;

/// Coarse quality bucket of a horizontal accuracy radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    Low,
    Medium,
    Good,
}

impl AccuracyTier {
    /// Classify an accuracy radius; `None` for a negative (invalid) radius
    pub fn from_accuracy(radius: f64) -> Option<Self> {
        if radius < 0.0 || radius.is_nan() {
            None
        } else if radius <= GOOD_ACCURACY_MAX {
            Some(AccuracyTier::Good)
        } else if radius >= LOW_ACCURACY_MIN {
            Some(AccuracyTier::Low)
        } else {
            Some(AccuracyTier::Medium)
        }
    }
}

/// Unit system used for display rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Meters per statute mile
pub const METERS_PER_MILE: f64 = 1609.34709;

impl UnitSystem {
    /// Meters in one "large" unit (km or mile)
    pub fn multiplier(&self) -> f64 {
        match self {
            UnitSystem::Metric => 1000.0,
            UnitSystem::Imperial => METERS_PER_MILE,
        }
    }

    /// Fraction of a large unit below which distances stay in small units
    pub fn wide_threshold(&self) -> f64 {
        match self {
            UnitSystem::Metric => 1.0,
            UnitSystem::Imperial => 0.5,
        }
    }

    /// Fraction digits to show for a speed in m/s.
    ///
    /// Speeds above 10 km/h (metric) or 10 mph (imperial) are shown whole.
    pub fn speed_fraction_digits(&self, speed: f64) -> usize {
        let threshold = match self {
            UnitSystem::Metric => 25.0 / 9.0,
            UnitSystem::Imperial => 4.4704,
        };
        if speed > threshold {
            0
        } else {
            2
        }
    }
}

/// Display-rounding bucket of a distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceTier {
    Uni,
    Kilo,
    FiveKilo,
    TenKilo,
    HundredKilo,
}

impl DistanceTier {
    pub fn from_meters(distance: f64, units: UnitSystem) -> Self {
        let k = units.multiplier();
        let w = units.wide_threshold();
        if distance >= 10.0 * k && distance < 100.0 * k {
            DistanceTier::TenKilo
        } else if distance > k * w && distance < 10.0 * k {
            if distance > 5.0 * k {
                DistanceTier::FiveKilo
            } else {
                DistanceTier::Kilo
            }
        } else if distance >= 100.0 * k {
            DistanceTier::HundredKilo
        } else {
            DistanceTier::Uni
        }
    }

    /// Fraction digits for a distance expressed in large units.
    ///
    /// With `split_at_five`, distances above five units drop to one digit.
    pub fn fraction_digits(&self, split_at_five: bool) -> usize {
        match self {
            DistanceTier::TenKilo => 1,
            DistanceTier::Kilo => 2,
            DistanceTier::FiveKilo if split_at_five => 1,
            DistanceTier::FiveKilo => 2,
            DistanceTier::Uni | DistanceTier::HundredKilo => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_tier_boundaries() {
        assert_eq!(AccuracyTier::from_accuracy(-0.1), None);
        assert_eq!(AccuracyTier::from_accuracy(0.0), Some(AccuracyTier::Good));
        assert_eq!(AccuracyTier::from_accuracy(16.0), Some(AccuracyTier::Good));
        assert_eq!(
            AccuracyTier::from_accuracy(16.0001),
            Some(AccuracyTier::Medium)
        );
        assert_eq!(
            AccuracyTier::from_accuracy(65.9999),
            Some(AccuracyTier::Medium)
        );
        assert_eq!(AccuracyTier::from_accuracy(66.0), Some(AccuracyTier::Low));
        assert_eq!(AccuracyTier::from_accuracy(500.0), Some(AccuracyTier::Low));
    }

    #[test]
    fn test_distance_tier_metric() {
        let m = UnitSystem::Metric;
        assert_eq!(DistanceTier::from_meters(500.0, m), DistanceTier::Uni);
        assert_eq!(DistanceTier::from_meters(1000.0, m), DistanceTier::Uni);
        assert_eq!(DistanceTier::from_meters(1500.0, m), DistanceTier::Kilo);
        assert_eq!(DistanceTier::from_meters(6100.0, m), DistanceTier::FiveKilo);
        assert_eq!(DistanceTier::from_meters(12500.0, m), DistanceTier::TenKilo);
        assert_eq!(
            DistanceTier::from_meters(100_000.0, m),
            DistanceTier::HundredKilo
        );
    }

    #[test]
    fn test_distance_tier_imperial() {
        let i = UnitSystem::Imperial;
        assert_eq!(DistanceTier::from_meters(274.33, i), DistanceTier::Uni);
        assert_eq!(DistanceTier::from_meters(1609.0, i), DistanceTier::Kilo);
        assert_eq!(
            DistanceTier::from_meters(48280.3, i),
            DistanceTier::TenKilo
        );
    }

    #[test]
    fn test_fraction_digits() {
        let m = UnitSystem::Metric;
        assert_eq!(
            DistanceTier::from_meters(500.0, m).fraction_digits(false),
            0
        );
        assert_eq!(
            DistanceTier::from_meters(6100.0, m).fraction_digits(false),
            2
        );
        assert_eq!(
            DistanceTier::from_meters(6100.0, m).fraction_digits(true),
            1
        );
        assert_eq!(
            DistanceTier::from_meters(12500.0, m).fraction_digits(false),
            1
        );
        assert_eq!(
            DistanceTier::from_meters(1609.0, UnitSystem::Imperial).fraction_digits(false),
            2
        );
    }

    #[test]
    fn test_speed_fraction_digits() {
        assert_eq!(UnitSystem::Metric.speed_fraction_digits(1.5), 2);
        assert_eq!(UnitSystem::Metric.speed_fraction_digits(3.0), 0);
        assert_eq!(UnitSystem::Imperial.speed_fraction_digits(3.0), 2);
        assert_eq!(UnitSystem::Imperial.speed_fraction_digits(5.0), 0);
    }
}
