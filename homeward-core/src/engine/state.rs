//! Per-episode engine state
//!
//! Everything here is rebuilt from the configuration at every `start()`, so
//! nothing leaks from one tracking episode into the next.

use crate::buffers::{MotionWindow, StatBuffer};
use crate::config::TrackingConfig;
use crate::eta::EtaEstimator;
use crate::indication::Indication;
use crate::relax::AccuracyRelaxation;
use crate::sample::PositionSample;

#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    /// Valid fixes received while running
    pub update_count: u32,
    /// Timestamp of the fix behind the last Good-tier indication
    pub last_good_at: Option<u64>,
    /// Latest fix, valid or not
    pub last_sample: Option<PositionSample>,
    /// Latest indication that passed the emission gate
    pub last_indication: Option<Indication>,
    pub standing_still: bool,
    pub signal_lost: bool,
    pub bearing_buffer: StatBuffer,
    pub eta: EtaEstimator,
    pub motion: MotionWindow,
    pub relaxation: AccuracyRelaxation,
}

impl SessionState {
    pub fn new(config: &TrackingConfig) -> Self {
        SessionState {
            update_count: 0,
            last_good_at: None,
            last_sample: None,
            last_indication: None,
            standing_still: false,
            signal_lost: false,
            bearing_buffer: StatBuffer::new(config.bearing_buffer_size),
            eta: EtaEstimator::new(
                config.speed_buffer_size,
                config.max_accuracy_difference,
                config.relaxed_eta_tolerance,
                config.max_eta,
            ),
            motion: MotionWindow::new(
                config.standing_still_window_ms(),
                config.standing_still_distance,
            ),
            relaxation: AccuracyRelaxation::new(),
        }
    }

    /// Whether the grace period since the last Good indication has run out
    pub fn grace_expired(&self, sample_ts: u64, grace_ms: u64) -> bool {
        match self.last_good_at {
            Some(t) => sample_ts > t.saturating_add(grace_ms),
            None => true,
        }
    }
}
