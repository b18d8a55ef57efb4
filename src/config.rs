//! Runtime configuration for a coverage run.
//!
//! Every reducer and command takes a [`CoverageConfig`] value at construction,
//! so several runs with different settings can coexist in one process.

use crate::sample::{CoverageError, Result};
use crate::streaming::buffers;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default number of distinct neighbors that marks a line as fully described.
///
/// Lines are sampled at their first point, last point and midpoint, so three
/// distinct neighbors means every sample landed on a different feature.
pub const DEFAULT_THRESHOLD: usize = 3;

/// Neighbor id meaning "no neighbor within the search radius".
pub const DEFAULT_SENTINEL: i64 = -1;

/// Configuration shared by the reducer and the commands built on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageConfig {
    /// Distinct non-sentinel neighbor count that sets `all_unique` on a line.
    pub threshold: usize,
    /// Neighbor id reserved for uncovered samples.
    pub sentinel: i64,
    /// Fail with `OutOfOrderInput` when `(line_id, position)` decreases.
    pub validate_order: bool,
    /// Identifier of this run, used to name the output table.
    pub run_id: String,
    /// Use smaller I/O buffers.
    pub low_memory: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            sentinel: DEFAULT_SENTINEL,
            validate_order: false,
            run_id: default_run_id(),
            low_memory: false,
        }
    }
}

impl CoverageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_sentinel(mut self, sentinel: i64) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_order = validate;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_low_memory(mut self, low_memory: bool) -> Self {
        self.low_memory = low_memory;
        self
    }

    /// Reject settings that cannot name an output table.
    pub fn validate(&self) -> Result<()> {
        if self.run_id.is_empty() {
            return Err(CoverageError::InvalidConfig(
                "run id must not be empty".to_string(),
            ));
        }
        if self
            .run_id
            .contains(|c: char| c == '/' || c == '\\' || c.is_whitespace())
        {
            return Err(CoverageError::InvalidConfig(format!(
                "run id '{}' must not contain path separators or whitespace",
                self.run_id
            )));
        }
        Ok(())
    }

    /// File name of the coverage table for this run.
    pub fn table_name(&self) -> String {
        format!("line_coverage_{}.tsv", self.run_id)
    }

    /// Full path of the coverage table inside `dir`.
    pub fn table_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.table_name())
    }

    #[inline]
    pub fn input_buffer_size(&self) -> usize {
        buffers::input_buffer_size(self.low_memory)
    }

    #[inline]
    pub fn output_buffer_size(&self) -> usize {
        buffers::output_buffer_size(self.low_memory)
    }
}

/// Unix-seconds timestamp, unique enough to keep per-run tables apart.
fn default_run_id() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    secs.to_string()
}
