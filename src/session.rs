//! Per-line accumulation state and finalization into output rows.
//!
//! # Continuation rule
//!
//! A sample extends coverage only when its neighbor equals the neighbor of the
//! immediately preceding sample on the same line. A neighbor that reappears
//! after a different neighbor starts a new run: the earlier run is never
//! re-joined, so only contiguous stretches contribute coverage length.
//!
//! The session is seeded with the first sample's neighbor and position, so the
//! first sample is a zero-length continuation and only registers an
//! intersection.

use crate::accumulator::NeighborAccumulation;
use crate::sample::Sample;
use rustc_hash::FxHashMap;

/// One row of the coverage table.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub line_id: i64,
    pub neighbor_id: i64,
    /// Sum of join distances, rounded to 4 decimal places.
    pub join_distance_sum: f64,
    pub coverage: f64,
    pub intersections: u32,
    /// Distinct non-sentinel neighbors on the line equal the threshold.
    pub all_unique: bool,
}

impl OutputRow {
    /// `all_unique` as the 0/1 flag written to tables.
    #[inline]
    pub fn all_unique_flag(&self) -> u8 {
        u8::from(self.all_unique)
    }
}

/// Accumulation state for the samples of a single line.
#[derive(Debug, Clone)]
pub struct LineSession {
    line_id: i64,
    last_neighbor_id: Option<i64>,
    last_position: f64,
    /// First-seen order.
    accumulations: Vec<NeighborAccumulation>,
    /// neighbor_id -> index into `accumulations`
    index: FxHashMap<i64, usize>,
}

impl LineSession {
    /// Open a session seeded from the first sample of a line.
    ///
    /// The sample itself is not accumulated; pass it to [`accumulate`](Self::accumulate).
    pub fn new(first: &Sample) -> Self {
        Self {
            line_id: first.line_id,
            last_neighbor_id: Some(first.neighbor_id),
            last_position: first.position,
            accumulations: Vec::with_capacity(4),
            index: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn line_id(&self) -> i64 {
        self.line_id
    }

    /// Number of distinct neighbors seen so far, sentinel included.
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.accumulations.len()
    }

    /// Accumulated state for one neighbor, if seen on this line.
    pub fn accumulation(&self, neighbor_id: i64) -> Option<&NeighborAccumulation> {
        self.index
            .get(&neighbor_id)
            .map(|&idx| &self.accumulations[idx])
    }

    /// Fold one sample of this line into the session.
    pub fn accumulate(&mut self, position: f64, neighbor_id: i64, join_distance: f64) {
        let is_continuation = self.last_neighbor_id == Some(neighbor_id);

        let idx = match self.index.get(&neighbor_id) {
            Some(&idx) => idx,
            None => {
                self.accumulations
                    .push(NeighborAccumulation::new(neighbor_id));
                let idx = self.accumulations.len() - 1;
                self.index.insert(neighbor_id, idx);
                idx
            }
        };

        let acc = &mut self.accumulations[idx];
        acc.update(self.last_position, position, is_continuation);
        acc.record_intersection(join_distance);

        self.last_neighbor_id = Some(neighbor_id);
        self.last_position = position;
    }

    /// Distinct neighbor ids on this line, excluding `sentinel`.
    pub fn distinct_covered(&self, sentinel: i64) -> usize {
        let has_sentinel = self.index.contains_key(&sentinel);
        self.accumulations.len() - usize::from(has_sentinel)
    }

    /// Close the session and produce one row per neighbor in first-seen order.
    pub fn finalize(self, threshold: usize, sentinel: i64) -> Vec<OutputRow> {
        let all_unique = self.distinct_covered(sentinel) == threshold;
        let line_id = self.line_id;

        self.accumulations
            .into_iter()
            .map(|acc| OutputRow {
                line_id,
                neighbor_id: acc.neighbor_id,
                join_distance_sum: round4(acc.join_distance_sum),
                coverage: acc.coverage,
                intersections: acc.intersections,
                all_unique,
            })
            .collect()
    }
}

/// Round to 4 decimal places.
///
/// Rounds the exact binary value, so `3.43105` (stored just below the tie)
/// gives `3.431`. Scaling by 10 000 first would round twice.
#[inline]
pub fn round4(value: f64) -> f64 {
    format!("{:.4}", value).parse().unwrap_or(value)
}
