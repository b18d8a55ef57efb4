//! Stream reducer: folds a sorted sample stream into coverage rows.
//!
//! # Algorithm
//!
//! For input sorted by `(line_id, position)`:
//! 1. The first sample of a line opens a [`LineSession`]
//! 2. Every sample of the line is accumulated into that session
//! 3. When a different `line_id` arrives, the active session is finalized and
//!    its rows are flushed to the sink before the new session opens
//! 4. At end of input, [`StreamReducer::finish`] flushes the last session
//!
//! # Memory Complexity
//!
//! O(d) where d = distinct neighbors on the current line. Only one session is
//! live at a time.
//!
//! # Requirements
//!
//! Input MUST be sorted by line id, then by position. This is not checked
//! unless order validation is enabled in the [`CoverageConfig`]; a line id
//! that reappears later otherwise opens a second, independent session.

use crate::config::CoverageConfig;
use crate::sample::{Result, Sample, SampleReader};
use crate::session::{LineSession, OutputRow};
use crate::streaming::SortValidator;
use log::{debug, trace};
use std::io::Read;

/// Produces samples in `(line_id, position)` order, once.
pub trait SampleSource {
    /// Next sample, or `None` when the source is exhausted.
    fn next_sample(&mut self) -> Result<Option<Sample>>;
}

impl<R: Read> SampleSource for SampleReader<R> {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        self.read_sample()
    }
}

/// Adapts an infallible sample iterator into a [`SampleSource`].
#[derive(Debug, Clone)]
pub struct IterSource<I>(pub I);

impl<I: Iterator<Item = Sample>> SampleSource for IterSource<I> {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        Ok(self.0.next())
    }
}

/// Build a [`SampleSource`] from anything iterable over samples.
pub fn from_samples<I>(samples: I) -> IterSource<I::IntoIter>
where
    I: IntoIterator<Item = Sample>,
{
    IterSource(samples.into_iter())
}

/// Accepts output rows in emission order.
pub trait RowSink {
    fn accept(&mut self, row: OutputRow) -> Result<()>;
}

impl RowSink for Vec<OutputRow> {
    fn accept(&mut self, row: OutputRow) -> Result<()> {
        self.push(row);
        Ok(())
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn accept(&mut self, row: OutputRow) -> Result<()> {
        (**self).accept(row)
    }
}

/// Counters collected over one reduction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReduceStats {
    /// Number of samples consumed
    pub samples_read: usize,
    /// Number of line sessions finalized
    pub lines_flushed: usize,
    /// Number of rows handed to the sink
    pub rows_written: usize,
    /// Samples carrying the sentinel neighbor
    pub uncovered_samples: usize,
    /// Lines whose rows carry `all_unique`
    pub fully_unique_lines: usize,
}

impl ReduceStats {
    /// Combine counters from independent reductions.
    pub fn merge(&mut self, other: &ReduceStats) {
        self.samples_read += other.samples_read;
        self.lines_flushed += other.lines_flushed;
        self.rows_written += other.rows_written;
        self.uncovered_samples += other.uncovered_samples;
        self.fully_unique_lines += other.fully_unique_lines;
    }
}

impl std::fmt::Display for ReduceStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Samples: {}, Lines: {}, Rows: {}, Uncovered: {}, All-unique lines: {}",
            self.samples_read,
            self.lines_flushed,
            self.rows_written,
            self.uncovered_samples,
            self.fully_unique_lines
        )
    }
}

/// Reducer state.
#[derive(Debug)]
enum ReducerState {
    NoActiveLine,
    ActiveLine(LineSession),
}

/// Single-pass reducer over a sorted sample stream.
///
/// Feed samples with [`push`](Self::push), then call [`finish`](Self::finish)
/// exactly once; `finish` consumes the reducer and flushes the final line.
pub struct StreamReducer<S: RowSink> {
    config: CoverageConfig,
    state: ReducerState,
    sink: S,
    validator: Option<SortValidator>,
    stats: ReduceStats,
}

impl<S: RowSink> StreamReducer<S> {
    pub fn new(config: CoverageConfig, sink: S) -> Self {
        let validator = config.validate_order.then(SortValidator::new);
        Self {
            config,
            state: ReducerState::NoActiveLine,
            sink,
            validator,
            stats: ReduceStats::default(),
        }
    }

    /// Line id of the active session, if any.
    pub fn active_line(&self) -> Option<i64> {
        match &self.state {
            ReducerState::NoActiveLine => None,
            ReducerState::ActiveLine(session) => Some(session.line_id()),
        }
    }

    pub fn stats(&self) -> &ReduceStats {
        &self.stats
    }

    /// Consume one sample.
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if let Some(validator) = self.validator.as_mut() {
            validator.validate(sample.line_id, sample.position)?;
        }

        trace!(
            "sample line={} pos={} neighbor={} dist={}",
            sample.line_id,
            sample.position,
            sample.neighbor_id,
            sample.join_distance
        );
        self.stats.samples_read += 1;
        if sample.neighbor_id == self.config.sentinel {
            self.stats.uncovered_samples += 1;
        }

        let state = std::mem::replace(&mut self.state, ReducerState::NoActiveLine);
        let mut session = match state {
            ReducerState::ActiveLine(session) if session.line_id() == sample.line_id => session,
            ReducerState::ActiveLine(session) => {
                self.flush(session)?;
                LineSession::new(&sample)
            }
            ReducerState::NoActiveLine => LineSession::new(&sample),
        };

        session.accumulate(sample.position, sample.neighbor_id, sample.join_distance);
        self.state = ReducerState::ActiveLine(session);
        Ok(())
    }

    /// Drain a whole source into the reducer.
    pub fn consume<Src: SampleSource + ?Sized>(&mut self, source: &mut Src) -> Result<()> {
        while let Some(sample) = source.next_sample()? {
            self.push(sample)?;
        }
        Ok(())
    }

    /// Terminal transition: flush the active session, if any, and return the
    /// sink with the collected statistics.
    pub fn finish(mut self) -> Result<(S, ReduceStats)> {
        let state = std::mem::replace(&mut self.state, ReducerState::NoActiveLine);
        if let ReducerState::ActiveLine(session) = state {
            self.flush(session)?;
        }
        Ok((self.sink, self.stats))
    }

    fn flush(&mut self, session: LineSession) -> Result<()> {
        let line_id = session.line_id();
        let rows = session.finalize(self.config.threshold, self.config.sentinel);

        debug!("flush line {} ({} rows)", line_id, rows.len());
        self.stats.lines_flushed += 1;
        if rows.first().is_some_and(|r| r.all_unique) {
            self.stats.fully_unique_lines += 1;
        }

        for row in rows {
            self.sink.accept(row)?;
            self.stats.rows_written += 1;
        }
        Ok(())
    }
}

/// Reduce a whole source into a sink.
pub fn reduce<Src, S>(source: &mut Src, sink: S, config: &CoverageConfig) -> Result<(S, ReduceStats)>
where
    Src: SampleSource + ?Sized,
    S: RowSink,
{
    let mut reducer = StreamReducer::new(config.clone(), sink);
    reducer.consume(source)?;
    reducer.finish()
}

/// Reduce an in-memory sample list into rows.
pub fn reduce_samples<I>(samples: I, config: &CoverageConfig) -> Result<(Vec<OutputRow>, ReduceStats)>
where
    I: IntoIterator<Item = Sample>,
{
    reduce(&mut from_samples(samples), Vec::new(), config)
}
