// Domain rules - Business logic and policies

use crate::domain::model::PhysicalRange;

/// Converts encoder elapsed time into a task percentage
pub struct ProgressRules;

impl ProgressRules {
    /// `floor(100 * elapsed / total)` clamped to `[0, 100]`.
    ///
    /// Returns `None` when the total duration is unknown (zero, negative or
    /// not finite) or the elapsed marker is unusable, so callers never report
    /// progress they cannot compute.
    pub fn percent(elapsed_seconds: f64, total_seconds: f64) -> Option<u8> {
        if !total_seconds.is_finite() || total_seconds <= 0.0 {
            return None;
        }
        if !elapsed_seconds.is_finite() {
            return None;
        }

        let percent = (elapsed_seconds / total_seconds * 100.0).floor();
        Some(percent.clamp(0.0, 100.0) as u8)
    }
}

/// Maps timestamps on the original timeline onto the timeline of an export
/// made of the given physical ranges, concatenated in order.
#[derive(Debug, Clone)]
pub struct TimelineRemapper {
    ranges: Vec<PhysicalRange>,
}

impl TimelineRemapper {
    pub fn new(ranges: &[PhysicalRange]) -> Self {
        Self {
            ranges: ranges.to_vec(),
        }
    }

    /// New position of `timestamp`, or `None` if it falls outside every kept range.
    ///
    /// When ranges overlap, the first range containing the timestamp wins.
    pub fn remap(&self, timestamp: f64) -> Option<f64> {
        let mut cumulative = 0.0;
        for range in &self.ranges {
            if timestamp >= range.physical_start && timestamp <= range.physical_end {
                return Some(timestamp - range.physical_start + cumulative);
            }
            cumulative += range.duration();
        }
        None
    }

    /// Remap a batch, dropping timestamps that were cut away
    pub fn remap_all(&self, timestamps: &[f64]) -> Vec<(f64, f64)> {
        timestamps
            .iter()
            .filter_map(|&old| self.remap(old).map(|new| (old, new)))
            .collect()
    }

    /// Length of the exported timeline
    pub fn total_duration(&self) -> f64 {
        self.ranges.iter().map(PhysicalRange::duration).sum()
    }
}
