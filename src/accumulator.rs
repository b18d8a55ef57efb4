//! Per-(line, neighbor) running totals.

/// Accumulated statistics for one neighbor on one line.
///
/// Created with all totals at zero the first time the neighbor is seen on a
/// line, then updated once per sample assigned to that neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborAccumulation {
    pub neighbor_id: i64,
    /// Positional length covered by contiguous runs of this neighbor.
    pub coverage: f64,
    pub intersections: u32,
    pub join_distance_sum: f64,
}

impl NeighborAccumulation {
    pub fn new(neighbor_id: i64) -> Self {
        Self {
            neighbor_id,
            coverage: 0.0,
            intersections: 0,
            join_distance_sum: 0.0,
        }
    }

    /// Extend coverage by `current - prior` when the sample continues the
    /// immediately preceding run.
    ///
    /// No clamping: out-of-order positions yield a negative delta.
    #[inline]
    pub fn update(&mut self, prior_position: f64, current_position: f64, is_continuation: bool) {
        if is_continuation {
            self.coverage += current_position - prior_position;
        }
    }

    /// Count one sample joined to this neighbor.
    #[inline]
    pub fn record_intersection(&mut self, join_distance: f64) {
        self.intersections += 1;
        self.join_distance_sum += join_distance;
    }
}
