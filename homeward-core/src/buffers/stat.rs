//! Running statistics over the most recent scalar samples

use std::collections::VecDeque;

/// Fixed-capacity buffer of scalars, most recent first.
///
/// When full, pushing a new value evicts the oldest one.
#[derive(Debug, Clone)]
pub struct StatBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl StatBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        StatBuffer {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_front(value);
        if self.values.len() > self.capacity {
            self.values.pop_back();
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Values, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Size of the "recent" half
    fn half(&self) -> usize {
        (self.capacity / 2).max(1)
    }

    /// Arithmetic mean; needs at least two samples
    pub fn mean(&self) -> Option<f64> {
        if self.values.len() < 2 {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Mean of the most recent `capacity / 2` samples
    pub fn recent_mean(&self) -> Option<f64> {
        let half = self.half();
        if self.values.len() < 2 || self.values.len() < half {
            return None;
        }
        Some(self.values.iter().take(half).sum::<f64>() / half as f64)
    }

    /// Mean of the samples after the recent half; needs `capacity / 2 + 2` samples
    pub fn old_mean(&self) -> Option<f64> {
        let half = self.half();
        if self.values.len() < half + 2 {
            return None;
        }
        let tail = self.values.len() - half;
        Some(self.values.iter().skip(half).sum::<f64>() / tail as f64)
    }

    /// Recency-weighted mean: the recent half counts double.
    ///
    /// Falls back to [`mean`](Self::mean) until both halves are available.
    pub fn weighted_mean(&self) -> Option<f64> {
        match (self.recent_mean(), self.old_mean()) {
            (Some(recent), Some(old)) => Some((recent * 2.0 + old) / 3.0),
            _ => self.mean(),
        }
    }

    /// Circular mean of the samples read as degrees, in (-180, 180]
    pub fn angle_mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let n = self.values.len() as f64;
        let (sin_sum, cos_sum) = self
            .values
            .iter()
            .map(|a| a.to_radians())
            .fold((0.0, 0.0), |(s, c), r| (s + r.sin(), c + r.cos()));
        Some((sin_sum / n).atan2(cos_sum / n).to_degrees())
    }
}
