//! linecov: line coverage from nearest-neighbor samples
//!
//! Folds samples taken along linear features (road segments), each joined to
//! its nearest neighboring feature (a bike lane), into per-line, per-neighbor
//! coverage rows.
//!
//! # Features
//!
//! - **Streaming reduction**: one pass, memory bounded by the neighbors of the
//!   current line
//! - **Parallel processing**: lines are independent and can be reduced on the
//!   Rayon pool
//! - **Explicit configuration**: threshold, sentinel and run id travel in a
//!   [`CoverageConfig`] value
//!
//! # Example
//!
//! ```rust
//! use linecov::{reduce_samples, CoverageConfig, Sample};
//!
//! let samples = vec![
//!     Sample::new(5, 0.0, 10, 2.0),
//!     Sample::new(5, 0.5, 10, 2.5),
//!     Sample::new(5, 1.0, 20, 1.0),
//! ];
//!
//! let (rows, _stats) = reduce_samples(samples, &CoverageConfig::default()).unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].coverage, 0.5);
//! assert_eq!(rows[0].join_distance_sum, 4.5);
//! ```

pub mod accumulator;
pub mod commands;
pub mod config;
pub mod parallel;
pub mod reducer;
pub mod sample;
pub mod session;
pub mod streaming;

// Re-export commonly used types
pub use accumulator::NeighborAccumulation;
pub use config::CoverageConfig;
pub use reducer::{
    from_samples, reduce, reduce_samples, ReduceStats, RowSink, SampleSource, StreamReducer,
};
pub use sample::{read_samples, CoverageError, Sample, SampleReader};
pub use session::{LineSession, OutputRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{CoverageCommand, GenerateCommand, SortCommand};
    pub use crate::config::CoverageConfig;
    pub use crate::reducer::{reduce, reduce_samples, RowSink, SampleSource, StreamReducer};
    pub use crate::sample::{read_samples, CoverageError, Sample, SampleReader};
    pub use crate::session::OutputRow;
}
