//! Coverage command: sample file in, coverage table out.
//!
//! Two execution modes:
//! - **Streaming** (default): samples are reduced as they are read, memory is
//!   O(d) for d distinct neighbors on the current line. Input must be sorted.
//! - **In-memory** (`sort` or `parallel`): all samples are loaded first, then
//!   optionally sorted by `(line_id, position)` and reduced sequentially or
//!   partitioned by line on the rayon pool.

use crate::config::CoverageConfig;
use crate::parallel::{parallel_sort_samples, reduce_parallel};
use crate::reducer::{reduce, reduce_samples, ReduceStats};
use crate::sample::{CoverageError, Sample, SampleReader};
use crate::streaming::TsvWriter;
use log::info;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Coverage command configuration.
#[derive(Debug, Clone)]
pub struct CoverageCommand {
    pub config: CoverageConfig,
    /// Write the `#line_id ...` header line
    pub header: bool,
    /// Sort samples in memory before reducing
    pub sort: bool,
    /// Reduce lines in parallel
    pub parallel: bool,
}

impl Default for CoverageCommand {
    fn default() -> Self {
        Self::new(CoverageConfig::default())
    }
}

impl CoverageCommand {
    pub fn new(config: CoverageConfig) -> Self {
        Self {
            config,
            header: true,
            sort: false,
            parallel: false,
        }
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn in_memory(&self) -> bool {
        self.sort || self.parallel
    }

    /// Reduce a sample file and write the coverage table.
    pub fn run<P: AsRef<Path>, W: Write>(
        &self,
        input_path: P,
        output: &mut W,
    ) -> Result<ReduceStats, CoverageError> {
        let file = File::open(input_path.as_ref())?;
        self.run_reader(file, output)
    }

    /// Reduce samples read from stdin.
    pub fn run_stdin<W: Write>(&self, output: &mut W) -> Result<ReduceStats, CoverageError> {
        let stdin = io::stdin();
        self.run_reader(stdin.lock(), output)
    }

    /// Reduce a sample file into `<dir>/line_coverage_<run_id>.tsv`.
    ///
    /// Returns the path of the written table.
    pub fn run_to_dir<P: AsRef<Path>>(
        &self,
        input_path: P,
        dir: &Path,
    ) -> Result<(PathBuf, ReduceStats), CoverageError> {
        self.config.validate()?;
        fs::create_dir_all(dir)?;
        let path = self.config.table_path(dir);
        let mut file = File::create(&path)?;
        let stats = self.run(input_path, &mut file)?;
        info!("Wrote coverage table {}", path.display());
        Ok((path, stats))
    }

    /// Reduce samples from any reader.
    pub fn run_reader<R: Read, W: Write>(
        &self,
        input: R,
        output: &mut W,
    ) -> Result<ReduceStats, CoverageError> {
        let reader = SampleReader::with_capacity(input, self.config.input_buffer_size());
        let mut writer = TsvWriter::with_capacity(self.config.output_buffer_size(), output);
        if self.header {
            writer.write_coverage_header()?;
        }

        let stats = if self.in_memory() {
            let samples = self.load(reader)?;
            self.reduce_in_memory(samples, &mut writer)?
        } else {
            let start = Instant::now();
            let mut reader = reader;
            let (_, stats) = reduce(&mut reader, &mut writer, &self.config)?;
            info!(
                "Created line coverage table: {:.3}s",
                start.elapsed().as_secs_f64()
            );
            stats
        };

        writer.flush()?;
        Ok(stats)
    }

    fn load<R: Read>(&self, reader: SampleReader<R>) -> Result<Vec<Sample>, CoverageError> {
        let start = Instant::now();
        let mut samples: Vec<Sample> = reader.samples().collect::<Result<_, _>>()?;
        info!(
            "Read {} samples: {:.3}s",
            samples.len(),
            start.elapsed().as_secs_f64()
        );

        if self.sort {
            let start = Instant::now();
            samples = parallel_sort_samples(samples);
            info!("Sorted samples: {:.3}s", start.elapsed().as_secs_f64());
        }
        Ok(samples)
    }

    fn reduce_in_memory<W: Write>(
        &self,
        samples: Vec<Sample>,
        writer: &mut TsvWriter<W>,
    ) -> Result<ReduceStats, CoverageError> {
        let start = Instant::now();
        let (rows, stats) = if self.parallel {
            reduce_parallel(samples, &self.config)?
        } else {
            reduce_samples(samples, &self.config)?
        };
        info!(
            "Created line coverage table: {:.3}s",
            start.elapsed().as_secs_f64()
        );

        let start = Instant::now();
        for row in &rows {
            writer.write_row(row)?;
        }
        info!("Wrote {} rows: {:.3}s", rows.len(), start.elapsed().as_secs_f64());
        Ok(stats)
    }
}
