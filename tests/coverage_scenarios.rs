//! End-to-end coverage scenarios.
//!
//! Each test writes a sample file, runs the coverage command over it and
//! checks the emitted table, including the final line of the input which has
//! no following line to trigger its flush.

use linecov::commands::CoverageCommand;
use linecov::{CoverageConfig, CoverageError, OutputRow};
use std::io::Write;
use tempfile::NamedTempFile;

const A: i64 = 101;
const B: i64 = 202;
const C: i64 = 303;

/// Write samples to a temp file and run streaming coverage over it.
fn run_coverage(content: &str) -> Vec<OutputRow> {
    run_with(CoverageCommand::default().with_header(false), content)
}

fn run_with(cmd: CoverageCommand, content: &str) -> Vec<OutputRow> {
    let mut input = NamedTempFile::new().unwrap();
    write!(input, "{}", content).unwrap();
    input.flush().unwrap();

    let mut output = Vec::new();
    cmd.run(input.path(), &mut output).unwrap();
    parse_table(&String::from_utf8(output).unwrap())
}

fn parse_table(text: &str) -> Vec<OutputRow> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| {
            let f: Vec<&str> = l.split('\t').collect();
            assert_eq!(f.len(), 6, "bad row: {l}");
            OutputRow {
                line_id: f[0].parse().unwrap(),
                neighbor_id: f[1].parse().unwrap(),
                join_distance_sum: f[2].parse().unwrap(),
                coverage: f[3].parse().unwrap(),
                intersections: f[4].parse().unwrap(),
                all_unique: match f[5] {
                    "0" => false,
                    "1" => true,
                    other => panic!("bad flag {other}"),
                },
            }
        })
        .collect()
}

fn row(
    line_id: i64,
    neighbor_id: i64,
    join_distance_sum: f64,
    coverage: f64,
    intersections: u32,
    all_unique: bool,
) -> OutputRow {
    OutputRow {
        line_id,
        neighbor_id,
        join_distance_sum,
        coverage,
        intersections,
        all_unique,
    }
}

fn samples(rows: &[(i64, f64, i64, f64)]) -> String {
    rows.iter()
        .map(|(l, p, n, d)| format!("{l}\t{p}\t{n}\t{d}\n"))
        .collect()
}

#[test]
fn single_line_continuation_then_switch() {
    let rows = run_coverage(&samples(&[(5, 0.0, A, 2.0), (5, 0.5, A, 2.5), (5, 1.0, B, 1.0)]));
    assert_eq!(
        rows,
        vec![row(5, A, 4.5, 0.5, 2, false), row(5, B, 1.0, 0.0, 1, false)]
    );
}

#[test]
fn three_distinct_neighbors_are_all_unique() {
    let rows = run_coverage(&samples(&[(6, 0.0, A, 1.0), (6, 0.5, B, 1.0), (6, 1.0, C, 1.0)]));
    assert_eq!(rows.len(), 3);
    for r in &rows {
        assert_eq!(r.coverage, 0.0);
        assert_eq!(r.intersections, 1);
        assert!(r.all_unique);
    }
}

#[test]
fn sentinel_gets_a_row_but_is_not_counted() {
    let rows = run_coverage(&samples(&[(7, 0.0, -1, 0.0), (7, 0.5, A, 3.0), (7, 1.0, B, 1.5)]));
    assert_eq!(
        rows,
        vec![
            row(7, -1, 0.0, 0.0, 1, false),
            row(7, A, 3.0, 0.0, 1, false),
            row(7, B, 1.5, 0.0, 1, false),
        ]
    );
}

#[test]
fn separated_runs_are_not_joined() {
    let rows = run_coverage(&samples(&[(8, 0.0, A, 1.0), (8, 0.5, B, 2.0), (8, 1.0, A, 1.0)]));
    assert_eq!(
        rows,
        vec![row(8, A, 2.0, 0.0, 2, false), row(8, B, 2.0, 0.0, 1, false)]
    );
}

#[test]
fn empty_input_yields_no_rows() {
    assert!(run_coverage("").is_empty());
    assert!(run_coverage("# only a comment\n\n").is_empty());
}

#[test]
fn last_line_is_flushed() {
    let rows = run_coverage(&samples(&[
        (1, 0.0, A, 1.0),
        (1, 1.0, A, 1.0),
        (2, 0.0, B, 1.0),
        (3, 0.0, C, 0.5),
        (3, 1.0, C, 0.5),
    ]));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.last().unwrap(), &row(3, C, 1.0, 1.0, 2, false));
}

#[test]
fn lines_emitted_in_ascending_order() {
    let rows = run_coverage(&samples(&[
        (10, 0.0, A, 1.0),
        (11, 0.0, B, 1.0),
        (11, 0.5, A, 1.0),
        (12, 0.0, -1, 0.0),
    ]));
    let ids: Vec<(i64, i64)> = rows.iter().map(|r| (r.line_id, r.neighbor_id)).collect();
    assert_eq!(ids, vec![(10, A), (11, B), (11, A), (12, -1)]);
}

#[test]
fn contiguous_run_spans_full_extent() {
    let rows = run_coverage(&samples(&[
        (4, 0.0, A, 0.1),
        (4, 0.125, A, 0.1),
        (4, 0.5, A, 0.1),
        (4, 0.875, A, 0.1),
    ]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].coverage, 0.875);
    assert_eq!(rows[0].intersections, 4);
    assert_eq!(rows[0].join_distance_sum, 0.4);
}

#[test]
fn negative_join_distance_passes_through() {
    let rows = run_coverage(&samples(&[(1, 0.0, A, -2.0), (1, 0.5, A, 1.0)]));
    assert_eq!(rows, vec![row(1, A, -1.0, 0.5, 2, false)]);
}

#[test]
fn join_distance_sum_rounds_from_exact_value() {
    let rows = run_coverage(&samples(&[(1, 0.0, A, 3.43105)]));
    assert_eq!(rows[0].join_distance_sum, 3.431);
}

#[test]
fn sort_mode_matches_pre_sorted_input() {
    let sorted = samples(&[(1, 0.0, A, 1.0), (1, 0.5, A, 1.0), (2, 0.0, B, 1.0), (2, 1.0, C, 2.0)]);
    let shuffled = samples(&[(2, 1.0, C, 2.0), (1, 0.5, A, 1.0), (2, 0.0, B, 1.0), (1, 0.0, A, 1.0)]);

    let expected = run_coverage(&sorted);
    let cmd = CoverageCommand::default().with_header(false).with_sort(true);
    assert_eq!(run_with(cmd, &shuffled), expected);
}

#[test]
fn parallel_mode_matches_streaming() {
    let content = samples(&[
        (1, 0.0, A, 1.0),
        (1, 0.5, A, 1.0),
        (1, 1.0, -1, 0.0),
        (2, 0.0, A, 1.0),
        (2, 0.5, B, 1.0),
        (2, 1.0, C, 1.0),
    ]);
    let cmd = CoverageCommand::default().with_header(false).with_parallel(true);
    assert_eq!(run_with(cmd, &content), run_coverage(&content));
}

#[test]
fn validation_mode_reports_reappearing_line() {
    let mut input = NamedTempFile::new().unwrap();
    write!(
        input,
        "{}",
        samples(&[(1, 0.0, A, 1.0), (2, 0.0, B, 1.0), (1, 0.5, A, 1.0)])
    )
    .unwrap();
    input.flush().unwrap();

    let cmd = CoverageCommand::new(CoverageConfig::default().with_validation(true));
    let mut output = Vec::new();
    let err = cmd.run(input.path(), &mut output).unwrap_err();
    match err {
        CoverageError::OutOfOrderInput {
            record,
            line_id,
            prev_line_id,
            ..
        } => {
            assert_eq!(record, 3);
            assert_eq!(line_id, 1);
            assert_eq!(prev_line_id, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_line_is_a_parse_error() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "1\t0\t{A}\t1.0").unwrap();
    writeln!(input, "1\t0.5\t{A}").unwrap();
    input.flush().unwrap();

    let mut output = Vec::new();
    let err = CoverageCommand::default()
        .run(input.path(), &mut output)
        .unwrap_err();
    assert!(matches!(err, CoverageError::Parse { line: 2, .. }));
}
