//! Sort a sample file into `(line_id, position)` order.
//!
//! Samples are loaded into memory and sorted with a stable parallel sort, so
//! samples sharing a line and position keep their input order.

use crate::parallel::parallel_sort_samples;
use crate::sample::{CoverageError, Sample, SampleReader};
use crate::streaming::TsvWriter;
use log::info;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;

/// Sort command configuration.
#[derive(Debug, Clone)]
pub struct SortCommand {
    /// Write the `#line_id ...` header line
    pub header: bool,
}

impl Default for SortCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics from a sort run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortStats {
    pub samples: usize,
    /// Samples that were already in order relative to their predecessor
    pub in_order: usize,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for SortStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sorted {} samples ({} already in order) in {:.3}s",
            self.samples, self.in_order, self.elapsed_secs
        )
    }
}

impl SortCommand {
    pub fn new() -> Self {
        Self { header: true }
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Sort a sample file.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input_path: P,
        output: &mut W,
    ) -> Result<SortStats, CoverageError> {
        let file = File::open(input_path.as_ref())?;
        self.run_reader(file, output)
    }

    /// Sort samples read from stdin.
    pub fn run_stdin<W: Write>(&self, output: &mut W) -> Result<SortStats, CoverageError> {
        let stdin = io::stdin();
        self.run_reader(stdin.lock(), output)
    }

    /// Sort samples from any reader.
    pub fn run_reader<R: Read, W: Write>(
        &self,
        input: R,
        output: &mut W,
    ) -> Result<SortStats, CoverageError> {
        let start = Instant::now();
        let samples: Vec<Sample> = SampleReader::new(input).samples().collect::<Result<_, _>>()?;

        let in_order = 1 + samples
            .windows(2)
            .filter(|w| w[0].sort_cmp(&w[1]).is_le())
            .count();
        let sorted = parallel_sort_samples(samples);

        let mut writer = TsvWriter::new(output);
        if self.header {
            writer.write_sample_header()?;
        }
        for sample in &sorted {
            writer.write_sample(sample)?;
        }
        writer.flush()?;

        let stats = SortStats {
            samples: sorted.len(),
            in_order: in_order.min(sorted.len()),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!("{}", stats);
        Ok(stats)
    }
}
