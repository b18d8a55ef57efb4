//! Generate synthetic sample files for benchmarking.
//!
//! Each line gets `samples_per_line` positions evenly spaced over `[0, 1]`.
//! Neighbors are drawn from a pool of ids; consecutive samples keep the same
//! neighbor with probability `stickiness`, which produces contiguous runs, and
//! a sample is uncovered (sentinel) with probability `uncovered_frac`.
//!
//! Output is always sorted by `(line_id, position)` and deterministic for a
//! given seed.

use crate::config::DEFAULT_SENTINEL;
use crate::sample::{CoverageError, Sample};
use crate::streaming::TsvWriter;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Configuration for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub lines: u64,
    pub samples_per_line: u32,
    /// Size of the neighbor id pool
    pub neighbors: u32,
    pub uncovered_frac: f64,
    pub stickiness: f64,
    pub max_distance: f64,
    pub seed: u64,
    pub sentinel: i64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            lines: 100_000,
            samples_per_line: 3,
            neighbors: 5_000,
            uncovered_frac: 0.2,
            stickiness: 0.6,
            max_distance: 12.0,
            seed: 42,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

impl GenerateConfig {
    pub fn validate(&self) -> Result<(), CoverageError> {
        if self.samples_per_line == 0 {
            return Err(CoverageError::InvalidConfig(
                "samples per line must be at least 1".to_string(),
            ));
        }
        if self.neighbors == 0 {
            return Err(CoverageError::InvalidConfig(
                "neighbor pool must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("uncovered fraction", self.uncovered_frac),
            ("stickiness", self.stickiness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoverageError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(CoverageError::InvalidConfig(format!(
                "max distance must be finite and non-negative, got {}",
                self.max_distance
            )));
        }
        Ok(())
    }
}

/// Statistics from generate operation.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    pub total_samples: u64,
    pub total_lines: u64,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} samples over {} lines ({:.1}s)",
            self.total_samples, self.total_lines, self.elapsed_secs
        )
    }
}

/// Synthetic sample generator.
pub struct GenerateCommand {
    config: GenerateConfig,
}

impl GenerateCommand {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Write a synthetic sample file to `path`.
    pub fn run_to_path(&self, path: &Path) -> Result<GenerateStats, CoverageError> {
        let mut file = File::create(path)?;
        let stats = self.run(&mut file)?;
        info!("Generated {} -> {}", stats, path.display());
        Ok(stats)
    }

    /// Write synthetic samples to any writer.
    pub fn run<W: Write>(&self, output: &mut W) -> Result<GenerateStats, CoverageError> {
        self.config.validate()?;
        let start = Instant::now();
        let cfg = &self.config;
        let mut rng = SmallRng::seed_from_u64(cfg.seed);
        let mut writer = TsvWriter::new(output);
        writer.write_sample_header()?;

        let mut stats = GenerateStats::default();
        for line_id in 0..cfg.lines as i64 {
            let mut neighbor = self.draw_neighbor(&mut rng);
            for i in 0..cfg.samples_per_line {
                if i > 0 && !rng.gen_bool(cfg.stickiness) {
                    neighbor = self.draw_neighbor(&mut rng);
                }
                let sample = Sample::new(
                    line_id,
                    position_of(i, cfg.samples_per_line),
                    neighbor,
                    self.draw_distance(&mut rng, neighbor),
                );
                writer.write_sample(&sample)?;
                stats.total_samples += 1;
            }
            stats.total_lines += 1;
        }

        writer.flush()?;
        stats.elapsed_secs = start.elapsed().as_secs_f64();
        Ok(stats)
    }

    fn draw_neighbor(&self, rng: &mut SmallRng) -> i64 {
        if rng.gen_bool(self.config.uncovered_frac) {
            self.config.sentinel
        } else {
            rng.gen_range(0..self.config.neighbors) as i64 + 1
        }
    }

    fn draw_distance(&self, rng: &mut SmallRng, neighbor: i64) -> f64 {
        if neighbor == self.config.sentinel || self.config.max_distance == 0.0 {
            0.0
        } else {
            // Quantized to 1/1000 so files stay compact.
            (rng.gen_range(0.0..self.config.max_distance) * 1000.0).round() / 1000.0
        }
    }
}

/// Evenly spaced position of sample `i` of `n` over `[0, 1]`.
#[inline]
fn position_of(i: u32, n: u32) -> f64 {
    if n <= 1 {
        0.0
    } else {
        i as f64 / (n - 1) as f64
    }
}
