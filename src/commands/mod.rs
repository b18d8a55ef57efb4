//! Command implementations for linecov.

pub mod coverage;
pub mod generate;
pub mod sort;

pub use crate::streaming::{verify_sorted, verify_sorted_reader};
pub use coverage::CoverageCommand;
pub use generate::{GenerateCommand, GenerateConfig, GenerateStats};
pub use sort::{SortCommand, SortStats};
