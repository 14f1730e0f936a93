//! Accuracy relaxation (battery saving)
//!
//! ```text
//!   relax_accuracy()          delay elapsed
//! Disabled ─────────────► Engaged ─────────────► Active
//!     ▲                      │                     │
//!     └──────────────────────┴─────────────────────┘
//!               increase_accuracy() / start()
//! ```
//!
//! While active, the requested GPS precision follows the minimum distance
//! to the alert radius: the further away, the coarser the fix we ask for.

use serde::{Deserialize, Serialize};

use crate::indication::Indication;

/// GPS precision the host should request from its location provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredAccuracy {
    #[default]
    Best,
    TenMeters,
    HundredMeters,
    Kilometer,
    ThreeKilometers,
}

impl DesiredAccuracy {
    /// Band for a minimum distance in meters
    pub fn for_minimum_distance(minimum_distance: f64) -> Self {
        if minimum_distance > 9000.0 {
            DesiredAccuracy::ThreeKilometers
        } else if minimum_distance > 3000.0 {
            DesiredAccuracy::Kilometer
        } else if minimum_distance > 1000.0 {
            DesiredAccuracy::HundredMeters
        } else if minimum_distance > 200.0 {
            DesiredAccuracy::TenMeters
        } else {
            DesiredAccuracy::Best
        }
    }

    /// Nominal radius in meters; 0 for best available
    pub fn nominal_radius(&self) -> f64 {
        match self {
            DesiredAccuracy::Best => 0.0,
            DesiredAccuracy::TenMeters => 10.0,
            DesiredAccuracy::HundredMeters => 100.0,
            DesiredAccuracy::Kilometer => 1000.0,
            DesiredAccuracy::ThreeKilometers => 3000.0,
        }
    }
}

/// Observable relaxation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationState {
    Disabled,
    Engaged,
    Active,
}

/// Relaxation bookkeeping for one tracking episode
#[derive(Debug, Clone, Default)]
pub struct AccuracyRelaxation {
    engaged_at: Option<u64>,
    active: bool,
}

impl AccuracyRelaxation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RelaxationState {
        match (self.engaged_at, self.active) {
            (None, _) => RelaxationState::Disabled,
            (Some(_), false) => RelaxationState::Engaged,
            (Some(_), true) => RelaxationState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged_at.is_some()
    }

    /// Start (or restart) the activation delay
    pub fn engage(&mut self, now_ms: u64) {
        self.engaged_at = Some(now_ms);
    }

    /// Back to Disabled
    pub fn release(&mut self) {
        self.engaged_at = None;
        self.active = false;
    }

    /// Promote to Active once the delay has passed, then pick a precision.
    ///
    /// Returns `None` when nothing should change: not engaged, still
    /// waiting, or no indication with a positive distance to judge from.
    pub fn assess(
        &mut self,
        now_ms: u64,
        enable_delay_ms: u64,
        last_indication: Option<&Indication>,
        alert_radius: f64,
    ) -> Option<DesiredAccuracy> {
        let engaged_at = self.engaged_at?;
        if !self.active && now_ms > engaged_at.saturating_add(enable_delay_ms) {
            self.active = true;
        }
        if !self.active {
            return None;
        }

        let indication = last_indication.filter(|i| i.distance() > 0.0)?;
        Some(DesiredAccuracy::for_minimum_distance(
            indication.minimum_distance(alert_radius),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::StatBuffer;
    use crate::indication::IndicationBuilder;
    use crate::sample::{PositionSample, TargetPoint};

    fn indication_at(distance_m: f64, accuracy: f64) -> Indication {
        let target = TargetPoint::new(45.0, 7.0);
        let sample = PositionSample::new(45.0 - distance_m / 111_195.0, 7.0, accuracy, 0);
        IndicationBuilder::default()
            .build(&sample, Some(&target), None, &mut StatBuffer::new(4))
            .unwrap()
    }

    #[test]
    fn test_bands() {
        assert_eq!(
            DesiredAccuracy::for_minimum_distance(9000.1),
            DesiredAccuracy::ThreeKilometers
        );
        assert_eq!(
            DesiredAccuracy::for_minimum_distance(9000.0),
            DesiredAccuracy::Kilometer
        );
        assert_eq!(
            DesiredAccuracy::for_minimum_distance(3000.0),
            DesiredAccuracy::HundredMeters
        );
        assert_eq!(
            DesiredAccuracy::for_minimum_distance(1000.0),
            DesiredAccuracy::TenMeters
        );
        assert_eq!(
            DesiredAccuracy::for_minimum_distance(200.0),
            DesiredAccuracy::Best
        );
        assert_eq!(
            DesiredAccuracy::for_minimum_distance(-50.0),
            DesiredAccuracy::Best
        );
    }

    #[test]
    fn test_state_transitions() {
        let mut r = AccuracyRelaxation::new();
        assert_eq!(r.state(), RelaxationState::Disabled);
        assert_eq!(r.assess(1_000, 120_000, None, 0.0), None);

        r.engage(0);
        assert_eq!(r.state(), RelaxationState::Engaged);
        assert_eq!(r.assess(120_000, 120_000, None, 0.0), None);
        assert_eq!(r.state(), RelaxationState::Engaged);

        r.assess(120_001, 120_000, None, 0.0);
        assert_eq!(r.state(), RelaxationState::Active);

        r.release();
        assert_eq!(r.state(), RelaxationState::Disabled);
        assert!(!r.is_active());
    }

    #[test]
    fn test_active_uses_minimum_distance() {
        let mut r = AccuracyRelaxation::new();
        r.engage(0);
        let far = indication_at(5000.0, 10.0);
        assert_eq!(
            r.assess(200_000, 120_000, Some(&far), 100.0),
            Some(DesiredAccuracy::Kilometer)
        );
        // 5000 - 10 - 2000 = 2990
        assert_eq!(
            r.assess(200_000, 120_000, Some(&far), 2000.0),
            Some(DesiredAccuracy::HundredMeters)
        );
    }

    #[test]
    fn test_needs_positive_distance() {
        let mut r = AccuracyRelaxation::new();
        r.engage(0);
        let sample = PositionSample::new(45.0, 7.0, 10.0, 0);
        let compass = IndicationBuilder::default()
            .build(&sample, None, None, &mut StatBuffer::new(4))
            .unwrap();
        assert_eq!(r.assess(200_000, 120_000, Some(&compass), 0.0), None);
        assert!(r.is_active());
    }

    #[test]
    fn test_nominal_radius() {
        assert_eq!(DesiredAccuracy::Best.nominal_radius(), 0.0);
        assert_eq!(DesiredAccuracy::ThreeKilometers.nominal_radius(), 3000.0);
    }
}
