//! Centralized streaming utilities for linecov.
//!
//! This module provides shared components for the streaming reducer:
//! - Zero-allocation sample parsing
//! - Sort validation
//! - Efficient table formatting
//! - Buffer sizing
//!
//! Reduction keeps O(d) memory where d = distinct neighbors on the current line.

pub mod buffers;
pub mod output;
pub mod parsing;
pub mod validation;

pub use output::TsvWriter;
pub use parsing::{parse_f64, parse_i64_fast, parse_sample_bytes, should_skip_line};
pub use validation::{verify_sorted, verify_sorted_reader, SortValidator};
