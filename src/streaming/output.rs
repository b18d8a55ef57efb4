//! Efficient table formatting for streaming output.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use crate::reducer::RowSink;
use crate::sample::{CoverageError, Sample};
use crate::session::OutputRow;
use std::io::{BufWriter, Write};

/// Buffer size for TsvWriter (2MB default).
const DEFAULT_BUFFER_SIZE: usize = crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;

/// Header line of the coverage table.
pub const COVERAGE_HEADER: &[u8] =
    b"#line_id\tneighbor_id\tjoin_dist_sum\tcoverage\tintersections\tall_unique\n";

/// Header line of a sample file.
pub const SAMPLE_HEADER: &[u8] = b"#line_id\tposition\tneighbor_id\tjoin_distance\n";

/// Tab-separated writer for coverage rows and samples.
pub struct TsvWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> TsvWriter<W> {
    /// Create a new TsvWriter with default buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    /// Create a new TsvWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write the coverage table header.
    pub fn write_coverage_header(&mut self) -> Result<(), CoverageError> {
        self.writer.write_all(COVERAGE_HEADER)?;
        Ok(())
    }

    /// Write the sample file header.
    pub fn write_sample_header(&mut self) -> Result<(), CoverageError> {
        self.writer.write_all(SAMPLE_HEADER)?;
        Ok(())
    }

    /// Write one coverage row followed by newline.
    #[inline]
    pub fn write_row(&mut self, row: &OutputRow) -> Result<(), CoverageError> {
        self.write_int(row.line_id)?;
        self.write_tab()?;
        self.write_int(row.neighbor_id)?;
        self.write_tab()?;
        self.write_float(row.join_distance_sum)?;
        self.write_tab()?;
        self.write_float(row.coverage)?;
        self.write_tab()?;
        self.write_int(row.intersections)?;
        self.write_tab()?;
        self.write_int(row.all_unique_flag())?;
        self.write_newline()
    }

    /// Write one sample followed by newline.
    #[inline]
    pub fn write_sample(&mut self, sample: &Sample) -> Result<(), CoverageError> {
        self.write_int(sample.line_id)?;
        self.write_tab()?;
        self.write_float(sample.position)?;
        self.write_tab()?;
        self.write_int(sample.neighbor_id)?;
        self.write_tab()?;
        self.write_float(sample.join_distance)?;
        self.write_newline()
    }

    #[inline]
    fn write_tab(&mut self) -> Result<(), CoverageError> {
        self.writer.write_all(b"\t")?;
        Ok(())
    }

    #[inline]
    fn write_newline(&mut self) -> Result<(), CoverageError> {
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write an integer using itoa.
    #[inline]
    fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), CoverageError> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write a float using ryu.
    #[inline]
    fn write_float(&mut self, f: f64) -> Result<(), CoverageError> {
        self.writer.write_all(self.ryu_buf.format(f).as_bytes())?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), CoverageError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> RowSink for TsvWriter<W> {
    fn accept(&mut self, row: OutputRow) -> Result<(), CoverageError> {
        self.write_row(&row)
    }
}
