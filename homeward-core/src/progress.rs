//! Progress toward the destination
//!
//! Progress is measured against the largest relative distance seen on a
//! Good-tier indication, so a noisy first fix does not set the baseline.

use crate::indication::Indication;
use crate::tiers::AccuracyTier;

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    initial: Option<f64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline relative distance, if any Good indication was seen
    pub fn initial_distance(&self) -> Option<f64> {
        self.initial
    }

    pub fn reset(&mut self) {
        self.initial = None;
    }

    /// Feed a delivered indication and return `1 - remaining / baseline`.
    ///
    /// `None` in compass mode or until a positive baseline exists. The value
    /// drops below zero when the user is further away than the baseline.
    pub fn update(&mut self, indication: &Indication, alert_radius: f64) -> Option<f64> {
        if indication.is_compass_mode() {
            return None;
        }
        let remaining = indication.relative_distance(alert_radius);
        if indication.accuracy_tier() == AccuracyTier::Good
            && self.initial.map_or(true, |initial| initial < remaining)
        {
            self.initial = Some(remaining);
        }
        let initial = self.initial.filter(|d| *d > 0.0)?;
        Some(1.0 - remaining / initial)
    }
}
