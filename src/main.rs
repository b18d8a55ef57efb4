//! linecov: line coverage from nearest-neighbor samples
//!
//! Usage: linecov <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use log::info;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use linecov::commands::{
    verify_sorted, verify_sorted_reader, CoverageCommand, GenerateCommand, GenerateConfig,
    SortCommand,
};
use linecov::config::{CoverageConfig, DEFAULT_SENTINEL, DEFAULT_THRESHOLD};
use linecov::CoverageError;

#[derive(Parser)]
#[command(name = "linecov")]
#[command(version)]
#[command(about = "Fold nearest-neighbor samples along lines into per-line coverage tables", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the coverage table from a sorted sample file
    Coverage {
        /// Input sample file (use - or omit for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Write line_coverage_<run-id>.tsv into this directory instead of stdout
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Distinct neighbor count that marks a line as fully unique
        #[arg(short = 'k', long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: usize,

        /// Neighbor id meaning "nothing within range"
        #[arg(long, default_value_t = DEFAULT_SENTINEL, allow_hyphen_values = true)]
        sentinel: i64,

        /// Fail on the first sample that breaks (line_id, position) order
        #[arg(long)]
        validate: bool,

        /// Sort samples in memory first (handles unsorted input)
        #[arg(long)]
        sort: bool,

        /// Reduce lines in parallel (loads all samples)
        #[arg(long)]
        parallel: bool,

        /// Run identifier used to name the output table
        #[arg(long)]
        run_id: Option<String>,

        /// Omit the header line
        #[arg(long)]
        no_header: bool,

        /// Use smaller I/O buffers
        #[arg(long)]
        low_memory: bool,

        /// Print run statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Sort a sample file by line id and position
    Sort {
        /// Input sample file (use - or omit for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Omit the header line
        #[arg(long)]
        no_header: bool,

        /// Print sorting statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Check that a sample file is sorted by line id and position
    Verify {
        /// Input sample file (use - or omit for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Generate a synthetic sorted sample file for benchmarking
    Generate {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of lines
        #[arg(long, default_value_t = 100_000)]
        lines: u64,

        /// Samples per line
        #[arg(long, default_value_t = 3)]
        samples_per_line: u32,

        /// Size of the neighbor id pool
        #[arg(long, default_value_t = 5_000)]
        neighbors: u32,

        /// Fraction of uncovered samples
        #[arg(long, default_value_t = 0.2)]
        uncovered_frac: f64,

        /// Probability that a sample keeps the previous neighbor
        #[arg(long, default_value_t = 0.6)]
        stickiness: f64,

        /// Maximum join distance
        #[arg(long, default_value_t = 12.0)]
        max_distance: f64,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
        {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let total = Instant::now();
    let result = match cli.command {
        Commands::Coverage {
            input,
            output_dir,
            threshold,
            sentinel,
            validate,
            sort,
            parallel,
            run_id,
            no_header,
            low_memory,
            stats,
        } => {
            let mut config = CoverageConfig::new()
                .with_threshold(threshold)
                .with_sentinel(sentinel)
                .with_validation(validate)
                .with_low_memory(low_memory);
            if let Some(run_id) = run_id {
                config = config.with_run_id(run_id);
            }
            let cmd = CoverageCommand::new(config)
                .with_header(!no_header)
                .with_sort(sort)
                .with_parallel(parallel);
            run_coverage(cmd, input, output_dir, stats)
        }

        Commands::Sort {
            input,
            no_header,
            stats,
        } => run_sort(input, no_header, stats),

        Commands::Verify { input } => run_verify(input),

        Commands::Generate {
            output,
            lines,
            samples_per_line,
            neighbors,
            uncovered_frac,
            stickiness,
            max_distance,
            seed,
        } => {
            let config = GenerateConfig {
                lines,
                samples_per_line,
                neighbors,
                uncovered_frac,
                stickiness,
                max_distance,
                seed,
                ..GenerateConfig::default()
            };
            run_generate(config, output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    info!("Completed: {:.3}s", total.elapsed().as_secs_f64());
}

/// Treat a missing input or `-` as stdin.
fn input_path(input: Option<PathBuf>) -> Option<PathBuf> {
    input.filter(|p| p.as_os_str() != "-")
}

fn run_coverage(
    cmd: CoverageCommand,
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    print_stats: bool,
) -> Result<(), CoverageError> {
    let input = input_path(input);
    info!("Run {}", cmd.config.run_id);

    let stats = match (input, output_dir) {
        (Some(path), Some(dir)) => {
            let (table, stats) = cmd.run_to_dir(&path, &dir)?;
            println!("{}", table.display());
            stats
        }
        (None, Some(_)) => {
            return Err(CoverageError::InvalidConfig(
                "--output-dir requires --input".to_string(),
            ));
        }
        (Some(path), None) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            cmd.run(&path, &mut handle)?
        }
        (None, None) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            cmd.run_stdin(&mut handle)?
        }
    };

    if print_stats {
        eprintln!("Coverage stats: {}", stats);
    }
    Ok(())
}

fn run_sort(input: Option<PathBuf>, no_header: bool, print_stats: bool) -> Result<(), CoverageError> {
    let cmd = SortCommand::new().with_header(!no_header);
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let stats = match input_path(input) {
        Some(path) => cmd.run(&path, &mut handle)?,
        None => cmd.run_stdin(&mut handle)?,
    };

    if print_stats {
        eprintln!("Sort stats: {}", stats);
    }
    Ok(())
}

fn run_verify(input: Option<PathBuf>) -> Result<(), CoverageError> {
    match input_path(input) {
        Some(path) => {
            verify_sorted(&path)?;
            eprintln!("{}: sorted", path.display());
        }
        None => {
            verify_sorted_reader(io::stdin().lock())?;
            eprintln!("stdin: sorted");
        }
    }
    Ok(())
}

fn run_generate(config: GenerateConfig, output: Option<PathBuf>) -> Result<(), CoverageError> {
    let cmd = GenerateCommand::new(config);
    let stats = match output {
        Some(path) => cmd.run_to_path(&path)?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            cmd.run(&mut handle)?
        }
    };
    eprintln!("Generated {}", stats);
    Ok(())
}
