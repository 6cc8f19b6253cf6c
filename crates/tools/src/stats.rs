/// Fixed-size circular buffer of instantaneous frame rates.
#[derive(Debug, Clone)]
pub struct FrameStats {
    samples: Vec<f32>,
    capacity: usize,
    next: usize,
}

impl FrameStats {
    pub const DEFAULT_CAPACITY: usize = 128;

    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    /// Record `1 / delta`. Non-positive deltas are not recorded.
    pub fn record(&mut self, delta: f32) -> Option<f32> {
        if delta <= 0.0 {
            return None;
        }
        let fps = 1.0 / delta;
        if self.samples.len() < self.capacity {
            self.samples.push(fps);
        } else {
            self.samples[self.next] = fps;
        }
        self.next = (self.next + 1) % self.capacity;
        tracing::trace!(fps, "frame rate sample");
        Some(fps)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn min(&self) -> Option<f32> {
        self.samples.iter().copied().reduce(f32::min)
    }

    pub fn max(&self) -> Option<f32> {
        self.samples.iter().copied().reduce(f32::max)
    }

    pub fn average(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }

    pub fn latest(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let index = (self.next + self.capacity - 1) % self.capacity;
        self.samples.get(index).copied()
    }

    /// Samples from oldest to newest, for plotting.
    pub fn ordered(&self) -> Vec<f32> {
        if self.samples.len() < self.capacity {
            return self.samples.clone();
        }
        let (newer, older) = self.samples.split_at(self.next);
        older.iter().chain(newer).copied().collect()
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_stats() {
        let stats = FrameStats::default();
        assert_eq!(stats.capacity(), 128);
        assert!(stats.min().is_none());
        assert!(stats.average().is_none());
        assert!(stats.latest().is_none());
    }

    #[test]
    fn stats_cover_recorded_samples_only() {
        let mut stats = FrameStats::new(8);
        stats.record(0.5);
        stats.record(0.25);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.min(), Some(2.0));
        assert_eq!(stats.max(), Some(4.0));
        assert_eq!(stats.average(), Some(3.0));
    }

    #[test]
    fn wraps_after_capacity() {
        let mut stats = FrameStats::new(3);
        for delta in [1.0, 0.5, 0.25, 0.125] {
            stats.record(delta);
        }
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.ordered(), vec![2.0, 4.0, 8.0]);
        assert_eq!(stats.latest(), Some(8.0));
        assert_eq!(stats.min(), Some(2.0));
    }

    #[test]
    fn non_positive_delta_is_skipped() {
        let mut stats = FrameStats::new(4);
        assert_eq!(stats.record(0.0), None);
        assert!(stats.is_empty());
        assert_eq!(FrameStats::new(0).capacity(), 1);
    }
}
