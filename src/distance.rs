//! Mergeable distance observations.
//!
//! A [`Distance`] is a running mean over the distances observed for one query
//! across many single genome graphs, together with the number of graphs that
//! contributed. `count == 0` means nothing has been observed yet.

use std::ops::{Add, AddAssign};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    distance: f64,
    count: usize,
}

impl Default for Distance {
    fn default() -> Self {
        Self::empty()
    }
}

impl Distance {
    pub fn new(distance: f64, count: usize) -> Self {
        Self { distance, count }
    }

    /// A single observation.
    pub fn observed(distance: f64) -> Self {
        Self::new(distance, 1)
    }

    /// No observation yet.
    pub fn empty() -> Self {
        Self::new(0.0, 0)
    }

    /// Explicit "unreachable in every sample" value.
    pub fn unreachable() -> Self {
        Self::new(f64::MAX, 0)
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Combine two accumulators into their count-weighted mean.
    pub fn merge(&self, other: &Distance) -> Distance {
        if other.count == 0 {
            return *self;
        }
        if self.count == 0 {
            return *other;
        }
        let count = self.count + other.count;
        let sum = self.distance * self.count as f64 + other.distance * other.count as f64;
        Distance::new(sum / count as f64, count)
    }
}

impl Add for Distance {
    type Output = Distance;

    fn add(self, other: Distance) -> Distance {
        self.merge(&other)
    }
}

impl AddAssign for Distance {
    fn add_assign(&mut self, other: Distance) {
        *self = self.merge(&other);
    }
}

/// One accumulator per query, indexed by the query's original index.
#[derive(Debug, Clone, Default)]
pub struct DistanceVector {
    distances: Vec<Distance>,
}

impl DistanceVector {
    pub fn new(size: usize) -> Self {
        Self {
            distances: vec![Distance::empty(); size],
        }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Distance> {
        self.distances.get(idx)
    }

    /// Merge a single observation into slot `idx`.
    pub fn add(&mut self, idx: usize, distance: Distance) {
        self.distances[idx] += distance;
    }

    /// Turn every slot that never received an observation into [`Distance::unreachable`].
    pub fn finalize(&mut self) {
        for distance in self.distances.iter_mut().filter(|d| d.is_empty()) {
            *distance = Distance::unreachable();
        }
    }

    pub fn distances(&self) -> Vec<f64> {
        self.distances.iter().map(Distance::distance).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.distances.iter().map(Distance::count).collect()
    }
}
