//! GOP-aligned cut planning
//!
//! Stream copy can only start cleanly on a keyframe, so a requested range is
//! widened outward to the surrounding keyframes. The extracted segment always
//! contains the whole request; `logical_offset` tells downstream trimming where
//! the request really starts.

use tracing::debug;

use crate::domain::model::PhysicalRange;

/// Maps requested time ranges onto keyframe boundaries
#[derive(Debug, Clone, Default)]
pub struct SegmentPlanner;

impl SegmentPlanner {
    /// Create a new segment planner
    pub fn new() -> Self {
        Self
    }

    /// Plan the physical cut for `[requested_start, requested_end]`.
    ///
    /// `keyframes` must be ascending. With no keyframes the request is
    /// returned as-is and the cut may land mid-GOP.
    pub fn plan(&self, keyframes: &[f64], requested_start: f64, requested_end: f64) -> PhysicalRange {
        let (Some(&first), Some(&last)) = (keyframes.first(), keyframes.last()) else {
            return PhysicalRange {
                physical_start: requested_start,
                physical_end: requested_end,
                logical_offset: 0.0,
            };
        };

        // Last keyframe at or before the requested start
        let physical_start = match keyframes.partition_point(|&k| k <= requested_start) {
            0 => first,
            n => keyframes[n - 1],
        };

        // First keyframe at or after the requested end
        let physical_end = keyframes
            .get(keyframes.partition_point(|&k| k < requested_end))
            .copied()
            .unwrap_or(last);

        let range = PhysicalRange {
            physical_start,
            physical_end,
            logical_offset: requested_start - physical_start,
        };

        debug!(
            requested_start,
            requested_end,
            physical_start = range.physical_start,
            physical_end = range.physical_end,
            "Planned physical cut"
        );

        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYFRAMES: [f64; 4] = [0.0, 5.0, 10.0, 15.0];

    #[test]
    fn test_widens_to_surrounding_keyframes() {
        let range = SegmentPlanner::new().plan(&KEYFRAMES, 3.0, 12.0);
        assert_eq!(range.physical_start, 0.0);
        assert_eq!(range.physical_end, 15.0);
        assert_eq!(range.logical_offset, 3.0);
    }

    #[test]
    fn test_exact_keyframe_hits_are_not_widened() {
        let range = SegmentPlanner::new().plan(&KEYFRAMES, 5.0, 10.0);
        assert_eq!(range.physical_start, 5.0);
        assert_eq!(range.physical_end, 10.0);
        assert_eq!(range.logical_offset, 0.0);
    }

    #[test]
    fn test_empty_keyframes_returns_request() {
        let range = SegmentPlanner::new().plan(&[], 3.2, 7.9);
        assert_eq!(range.physical_start, 3.2);
        assert_eq!(range.physical_end, 7.9);
        assert_eq!(range.logical_offset, 0.0);
    }

    #[test]
    fn test_start_before_first_keyframe_uses_first() {
        let keyframes = [2.0, 4.0, 6.0];
        let range = SegmentPlanner::new().plan(&keyframes, 1.0, 3.0);
        assert_eq!(range.physical_start, 2.0);
        assert_eq!(range.physical_end, 4.0);
        assert_eq!(range.logical_offset, -1.0);
    }

    #[test]
    fn test_end_after_last_keyframe_uses_last() {
        let range = SegmentPlanner::new().plan(&KEYFRAMES, 11.0, 42.0);
        assert_eq!(range.physical_start, 10.0);
        assert_eq!(range.physical_end, 15.0);
        assert_eq!(range.logical_offset, 1.0);
    }

    #[test]
    fn test_single_keyframe() {
        let range = SegmentPlanner::new().plan(&[4.0], 6.0, 9.0);
        assert_eq!(range.physical_start, 4.0);
        assert_eq!(range.physical_end, 4.0);
    }

    #[test]
    fn test_never_narrows_inside_keyframe_span() {
        let keyframes: Vec<f64> = (0..40).map(|i| i as f64 * 2.5).collect();
        let planner = SegmentPlanner::new();
        let last = *keyframes.last().unwrap();

        let mut start = 0.0;
        while start < last {
            let mut end = start;
            while end <= last {
                let range = planner.plan(&keyframes, start, end);
                assert!(range.physical_start <= start, "start {} -> {:?}", start, range);
                assert!(range.physical_end >= end, "end {} -> {:?}", end, range);
                assert!(range.logical_offset >= 0.0);
                end += 1.7;
            }
            start += 1.3;
        }
    }
}
