//! Parallel processing utilities using Rayon.
//!
//! Lines are independent, so a sample set can be partitioned on `line_id`
//! and each partition reduced by its own [`StreamReducer`] with no shared
//! state.
//!
//! [`StreamReducer`]: crate::reducer::StreamReducer

use crate::config::CoverageConfig;
use crate::reducer::{reduce_samples, ReduceStats};
use crate::sample::{Result, Sample};
use crate::session::OutputRow;
use crate::streaming::SortValidator;
use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Minimum number of samples before enabling parallelization.
/// Below this threshold, sequential processing is faster due to
/// thread spawn overhead.
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Group samples by line id, preserving within-line order.
///
/// Groups are returned in ascending line id order.
pub fn group_by_line(samples: Vec<Sample>) -> Vec<(i64, Vec<Sample>)> {
    let mut groups: FxHashMap<i64, Vec<Sample>> = FxHashMap::default();

    for sample in samples {
        groups.entry(sample.line_id).or_default().push(sample);
    }

    let mut groups: Vec<(i64, Vec<Sample>)> = groups.into_iter().collect();
    groups.par_sort_unstable_by_key(|(line_id, _)| *line_id);
    groups
}

/// Parallel stable sort of samples by `(line_id, position)`.
pub fn parallel_sort_samples(mut samples: Vec<Sample>) -> Vec<Sample> {
    samples.par_sort_by(Sample::sort_cmp);
    samples
}

/// Reduce samples with one reducer per line, on the rayon pool once the input
/// reaches [`PARALLEL_THRESHOLD`].
///
/// Samples are always partitioned on `line_id`, so the rows do not depend on
/// input size. For sorted input they equal those of a sequential pass. A line
/// id that appears in several places of unsorted input is gathered into one
/// partition here, whereas the sequential pass would fragment it.
pub fn reduce_parallel(
    samples: Vec<Sample>,
    config: &CoverageConfig,
) -> Result<(Vec<OutputRow>, ReduceStats)> {
    if config.validate_order {
        let mut validator = SortValidator::new();
        for sample in &samples {
            validator.validate(sample.line_id, sample.position)?;
        }
    }

    let use_pool = samples.len() >= PARALLEL_THRESHOLD;
    let groups = group_by_line(samples);
    let work = ParallelStats::from_groups(&groups);
    debug!(
        "reducing {} samples over {} lines (max {} per line)",
        work.total_samples, work.num_lines, work.max_samples_per_line
    );

    // Validation already ran over the whole input.
    let partition_config = config.clone().with_validation(false);
    let reduce_line =
        |(_, line_samples): (i64, Vec<Sample>)| reduce_samples(line_samples, &partition_config);
    let results: Vec<Result<(Vec<OutputRow>, ReduceStats)>> = if use_pool {
        groups.into_par_iter().map(reduce_line).collect()
    } else {
        groups.into_iter().map(reduce_line).collect()
    };

    let mut rows = Vec::new();
    let mut stats = ReduceStats::default();
    for result in results {
        let (line_rows, line_stats) = result?;
        rows.extend(line_rows);
        stats.merge(&line_stats);
    }

    Ok((rows, stats))
}

/// Statistics for parallel work distribution.
#[derive(Debug, Clone)]
pub struct ParallelStats {
    pub total_samples: usize,
    pub num_lines: usize,
    pub max_samples_per_line: usize,
}

impl ParallelStats {
    pub fn from_groups(groups: &[(i64, Vec<Sample>)]) -> Self {
        Self {
            total_samples: groups.iter().map(|(_, s)| s.len()).sum(),
            num_lines: groups.len(),
            max_samples_per_line: groups.iter().map(|(_, s)| s.len()).max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(lines: i64) -> Vec<Sample> {
        let mut samples = Vec::new();
        for line_id in 0..lines {
            for (i, pos) in [0.0, 0.5, 1.0].into_iter().enumerate() {
                let neighbor = match (line_id + i as i64) % 4 {
                    0 => -1,
                    n => line_id % 7 + n,
                };
                samples.push(Sample::new(line_id, pos, neighbor, pos * 2.0));
            }
        }
        samples
    }

    #[test]
    fn test_group_by_line() {
        let samples = vec![
            Sample::new(2, 0.0, 1, 0.0),
            Sample::new(1, 0.0, 1, 0.0),
            Sample::new(2, 1.0, 1, 0.0),
        ];

        let groups = group_by_line(samples);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, 1);
        assert_eq!(groups[1].0, 2);
        assert_eq!(groups[1].1.len(), 2);
        assert_eq!(groups[1].1[1].position, 1.0);

        let stats = ParallelStats::from_groups(&groups);
        assert_eq!(stats.total_samples, 3);
        assert_eq!(stats.num_lines, 2);
        assert_eq!(stats.max_samples_per_line, 2);
    }

    #[test]
    fn test_parallel_sort_samples() {
        let samples = vec![
            Sample::new(2, 0.0, 1, 0.0),
            Sample::new(1, 1.0, 1, 0.0),
            Sample::new(1, 0.5, 2, 0.0),
        ];

        let sorted = parallel_sort_samples(samples);

        assert_eq!(sorted[0].line_id, 1);
        assert_eq!(sorted[0].position, 0.5);
        assert_eq!(sorted[1].position, 1.0);
        assert_eq!(sorted[2].line_id, 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let samples = synthetic(5_000);
        let config = CoverageConfig::default();

        let (seq_rows, seq_stats) = reduce_samples(samples.clone(), &config).unwrap();
        let (par_rows, par_stats) = reduce_parallel(samples, &config).unwrap();

        assert_eq!(seq_rows, par_rows);
        assert_eq!(seq_stats, par_stats);
    }

    #[test]
    fn test_small_unsorted_input_is_partitioned() {
        // Line 1 reappears after line 2; both of its samples land in one session.
        let samples = vec![
            Sample::new(1, 0.0, 5, 1.0),
            Sample::new(2, 0.0, 6, 0.0),
            Sample::new(1, 0.5, 5, 2.0),
        ];
        assert!(samples.len() < PARALLEL_THRESHOLD);

        let (rows, stats) = reduce_parallel(samples, &CoverageConfig::default()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line_id, 1);
        assert_eq!(rows[0].coverage, 0.5);
        assert_eq!(rows[0].intersections, 2);
        assert_eq!(rows[0].join_distance_sum, 3.0);
        assert_eq!(rows[1].line_id, 2);
        assert_eq!(stats.lines_flushed, 2);
    }

    #[test]
    fn test_parallel_validation() {
        let mut samples = synthetic(4_000);
        samples.swap(0, 5);
        let config = CoverageConfig::default().with_validation(true);
        assert!(reduce_parallel(samples, &config).is_err());
    }
}
