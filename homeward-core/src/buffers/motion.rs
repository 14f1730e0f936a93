//! Standing-still detection over a sliding time window

use std::collections::VecDeque;

use crate::sample::PositionSample;

/// Slack between the window length and the span a window must cover to count as full
const FULL_WINDOW_SLACK_MS: u64 = 5_000;

/// Fixes received within the last `max_duration_ms`, oldest first
#[derive(Debug, Clone)]
pub struct MotionWindow {
    samples: VecDeque<PositionSample>,
    max_duration_ms: u64,
    standing_distance: f64,
}

impl MotionWindow {
    pub fn new(max_duration_ms: u64, standing_distance: f64) -> Self {
        MotionWindow {
            samples: VecDeque::new(),
            max_duration_ms,
            standing_distance,
        }
    }

    pub fn push(&mut self, sample: PositionSample, now_ms: u64) {
        self.samples.push_back(sample);
        self.purge(now_ms);
    }

    /// Drop fixes older than the window
    fn purge(&mut self, now_ms: u64) {
        let max = self.max_duration_ms;
        self.samples
            .retain(|s| s.timestamp.saturating_add(max) > now_ms);
    }

    /// True when the window is full and every pair of fixes lies within the standing distance
    pub fn is_standing(&mut self, now_ms: u64) -> bool {
        self.purge(now_ms);

        let (first, last) = match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) if self.samples.len() >= 2 => (first, last),
            _ => return false,
        };

        // A sparse window says nothing about the whole period
        let span = last.timestamp.saturating_sub(first.timestamp);
        if span <= self.max_duration_ms.saturating_sub(FULL_WINDOW_SLACK_MS) {
            return false;
        }

        let samples = self.samples.make_contiguous();
        for (i, a) in samples.iter().enumerate() {
            for b in &samples[i + 1..] {
                if a.distance_to(b) > self.standing_distance {
                    return false;
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
