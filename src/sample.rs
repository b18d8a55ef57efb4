//! Streaming sample file reader.
//!
//! A sample file holds one joined sample per line:
//!
//! ```text
//! line_id<TAB>position<TAB>neighbor_id<TAB>join_distance
//! ```
//!
//! Trailing columns are ignored, as are empty lines and `#` comments.

use crate::streaming::parsing::{parse_sample_bytes, should_skip_line};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading samples or reducing them.
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(
        "Input not sorted: sample {record} (line {line_id}, position {position}) \
         comes after (line {prev_line_id}, position {prev_position})"
    )]
    OutOfOrderInput {
        record: usize,
        line_id: i64,
        position: f64,
        prev_line_id: i64,
        prev_position: f64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CoverageError>;

/// One position along a line with its nearest-neighbor assignment attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub line_id: i64,
    pub position: f64,
    /// Neighbor feature id, or the sentinel when nothing was within range.
    pub neighbor_id: i64,
    pub join_distance: f64,
}

impl Sample {
    pub fn new(line_id: i64, position: f64, neighbor_id: i64, join_distance: f64) -> Self {
        Self {
            line_id,
            position,
            neighbor_id,
            join_distance,
        }
    }

    /// Ordering key required by the reducer: `(line_id, position)`.
    #[inline]
    pub fn sort_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line_id
            .cmp(&other.line_id)
            .then(self.position.total_cmp(&other.position))
    }
}

/// A streaming sample reader.
pub struct SampleReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl SampleReader<File> {
    /// Open a sample file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> SampleReader<R> {
    /// Create a new sample reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: Vec::with_capacity(128),
        }
    }

    /// Create a sample reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: Vec::with_capacity(128),
        }
    }

    /// Read the next sample, or `None` at end of input.
    pub fn read_sample(&mut self) -> Result<Option<Sample>> {
        loop {
            self.buffer.clear();
            // Raw bytes: invalid UTF-8 surfaces as a parse error on its line.
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_ascii_end();
            if should_skip_line(line) {
                continue;
            }

            return match parse_sample_bytes(line) {
                Some(sample) => Ok(Some(sample)),
                None => Err(CoverageError::Parse {
                    line: self.line_number,
                    message: format!(
                        "Expected line_id, position, neighbor_id, join_distance; got '{}'",
                        String::from_utf8_lossy(line)
                    ),
                }),
            };
        }
    }

    /// Current 1-based line number.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Get an iterator over all samples.
    pub fn samples(self) -> SampleIter<R> {
        SampleIter { reader: self }
    }
}

/// Iterator over samples.
pub struct SampleIter<R: Read> {
    reader: SampleReader<R>,
}

impl<R: Read> Iterator for SampleIter<R> {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_sample() {
            Ok(Some(sample)) => Some(Ok(sample)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read all samples from a file.
pub fn read_samples<P: AsRef<Path>>(path: P) -> Result<Vec<Sample>> {
    SampleReader::from_path(path)?.samples().collect()
}

/// Parse samples from an in-memory string.
pub fn parse_samples(content: &str) -> Result<Vec<Sample>> {
    SampleReader::new(content.as_bytes()).samples().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_samples() {
        let content = "# header\n5\t0\t10\t2.0\n\n5\t0.5\t-1\t0\textra\n";
        let samples = parse_samples(content).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], Sample::new(5, 0.0, 10, 2.0));
        assert_eq!(samples[1], Sample::new(5, 0.5, -1, 0.0));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let content = "1\t0\t2\t1.0\n1\tabc\t2\t1.0\n";
        let err = parse_samples(content).unwrap_err();
        match err {
            CoverageError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_utf8_reports_line() {
        let bytes: &[u8] = b"1\t0\t2\t1.0\n1\t\xff\t2\t1.0\n3\t0\t2\t1.0\n";
        let mut reader = SampleReader::new(bytes);

        assert!(reader.read_sample().unwrap().is_some());
        match reader.read_sample().unwrap_err() {
            CoverageError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains('\u{fffd}'));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(reader.line_number(), 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let samples = parse_samples("1\t0\t2\t1.0\r\n1\t0.5\t2\t1.5\r\n").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].join_distance, 1.5);
    }

    #[test]
    fn test_sort_cmp() {
        let a = Sample::new(1, 0.5, 0, 0.0);
        let b = Sample::new(1, 1.0, 0, 0.0);
        let c = Sample::new(2, 0.0, 0, 0.0);
        assert!(a.sort_cmp(&b).is_lt());
        assert!(b.sort_cmp(&c).is_lt());
        assert!(c.sort_cmp(&a).is_gt());
    }
}
