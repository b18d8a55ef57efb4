//! Sort validation for streaming reduction.
//!
//! The reducer requires samples sorted ascending by `(line_id, position)`.
//! Because line ids are ascending, a line id reappearing after the reducer
//! moved past it is also a decrease and is caught by the same check.

use crate::sample::{CoverageError, SampleReader};
use std::cmp::Ordering;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Verify that a sample file is sorted by line id and position.
///
/// Returns Ok(()) if sorted, `OutOfOrderInput` for the first violation.
///
/// # Example
///
/// ```rust,no_run
/// use linecov::streaming::verify_sorted;
///
/// verify_sorted("samples.tsv").expect("File must be sorted");
/// ```
pub fn verify_sorted<P: AsRef<Path>>(path: P) -> Result<(), CoverageError> {
    let file = File::open(path.as_ref())?;
    verify_sorted_reader(file)
}

/// Verify that samples from any reader are sorted.
pub fn verify_sorted_reader<R: Read>(reader: R) -> Result<(), CoverageError> {
    let mut validator = SortValidator::new();
    for sample in SampleReader::new(reader).samples() {
        let sample = sample?;
        validator.validate(sample.line_id, sample.position)?;
    }
    Ok(())
}

/// Inline sort validator for use within the reduction loop.
///
/// Avoids reading the input twice by validating records as they are
/// reduced.
#[derive(Debug, Default)]
pub struct SortValidator {
    prev: Option<(i64, f64)>,
    record_count: usize,
}

impl SortValidator {
    /// Create a new sort validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(&mut self, line_id: i64, position: f64) -> Result<(), CoverageError> {
        self.record_count += 1;

        if let Some((prev_line_id, prev_position)) = self.prev {
            let order = line_id
                .cmp(&prev_line_id)
                .then(position.total_cmp(&prev_position));
            if order == Ordering::Less {
                return Err(CoverageError::OutOfOrderInput {
                    record: self.record_count,
                    line_id,
                    position,
                    prev_line_id,
                    prev_position,
                });
            }
        }

        self.prev = Some((line_id, position));
        Ok(())
    }

    /// Reset validator state.
    pub fn reset(&mut self) {
        self.prev = None;
        self.record_count = 0;
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}
