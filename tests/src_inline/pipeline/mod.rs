use super::*;
use std::fs;
use tempfile::tempdir;

use crate::model::features::FeatureRow;
use crate::model::matrix::Matrix;
use crate::model::normalization::NormalizationParams;
use crate::pipeline::stage5_progress::{NoProgress, ProgressEvent};
use crate::scorer::{FnScorer, ScorerError};

fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write input");
    path
}

fn config_with_chunk(chunk_size: usize) -> GenerateConfig {
    let mut config = GenerateConfig::default();
    config.batch.chunk_size = chunk_size;
    config
}

/// Deterministic scorer: real = sum of the normalized row, imag = first column.
fn sum_scorer() -> FnScorer<impl FnMut(&Matrix) -> Result<Matrix, ScorerError>> {
    FnScorer(|input: &Matrix| -> Result<Matrix, ScorerError> {
        let out: Vec<[f32; 2]> = input
            .iter_rows()
            .map(|r| [r.iter().sum(), r[0]])
            .collect();
        Ok(Matrix::from_rows(&out))
    })
}

fn rows_input(count: usize) -> String {
    let mut text = String::new();
    for i in 0..count {
        text.push_str(&format!("{} {} {}.5 {}.25\n", i, i + 1, i % 7, i % 3));
    }
    text
}

#[test]
fn two_rows_single_batch_end_to_end() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "input.txt", "1 2 3.0 4.0\n5 6 7.0 8.0\n");

    let params = NormalizationParams::default();
    let expected_inputs: Vec<f32> = [[1.0f32, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]]
        .iter()
        .flat_map(|r| params.normalize(&FeatureRow(*r)).0)
        .collect();
    let mut seen = Vec::new();
    let mut scorer = FnScorer(|input: &Matrix| -> Result<Matrix, ScorerError> {
        seen = input.as_slice().to_vec();
        Ok(Matrix::from_rows(&[[0.1f32, 0.2], [0.3, 0.4]]))
    });

    let report = run_generate(
        &input,
        &GenerateConfig::default(),
        &mut scorer,
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("run");
    drop(scorer);

    assert_eq!(seen, expected_inputs);
    let out = fs::read_to_string(dir.path().join("input_generated.txt")).expect("output");
    assert_eq!(
        out,
        "1\t2\t3.000000\t4.000000\t0.100000\t0.200000\n5\t6\t7.000000\t8.000000\t0.300000\t0.400000\n"
    );
    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(report.batches, 1);
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.output, Some(dir.path().join("input_generated.txt")));
}

#[test]
fn non_numeric_field_drops_the_batch() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "bad.txt", "1 2 three 4.0\n");
    let mut scorer = sum_scorer();

    let report = run_generate(
        &input,
        &GenerateConfig::default(),
        &mut scorer,
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("run");

    assert!(!dir.path().join("bad_generated.txt").exists());
    assert_eq!(report.rows_written, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, "parse");
    assert_eq!(report.failures[0].first_line, 1);
    assert_eq!(report.state, PipelineState::Done);
}

#[test]
fn later_batches_survive_a_bad_batch() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(
        dir.path(),
        "mixed.txt",
        "1 2 3 4\n5 6 7 8\n9 x 11 12\n13 14 15 16\n17 18 19 20\n",
    );
    let mut scorer = sum_scorer();

    let report = run_generate(
        &input,
        &config_with_chunk(2),
        &mut scorer,
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("run");

    let out = fs::read_to_string(dir.path().join("mixed_generated.txt")).expect("output");
    let firsts: Vec<&str> = out.lines().map(|l| l.split('\t').next().unwrap_or("")).collect();
    assert_eq!(firsts, vec!["1", "5", "17"]);
    assert_eq!(report.batches, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].batch, 1);
}

#[test]
fn strict_policy_aborts_on_first_bad_batch() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(
        dir.path(),
        "strict.txt",
        "1 2 3 4\n5 6 7 8\n9 x 11 12\n13 14 15 16\n17 18 19 20\n",
    );
    let mut scorer = sum_scorer();
    let control = RunControl {
        policy: FailurePolicy::Strict,
        cancel: CancelToken::new(),
    };

    let err = run_generate(
        &input,
        &config_with_chunk(2),
        &mut scorer,
        &mut NoProgress,
        &control,
    )
    .expect_err("strict");
    assert!(matches!(
        err,
        GenerateError::Batch {
            batch: 1,
            source: BatchError::Parse(_)
        }
    ));
    let out = fs::read_to_string(dir.path().join("strict_generated.txt")).expect("output");
    assert_eq!(out.lines().count(), 2);
}

#[test]
fn scorer_failure_is_recorded_and_skipped() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "fail.txt", "1 2 3 4\n");
    let mut scorer = FnScorer(|_: &Matrix| -> Result<Matrix, ScorerError> {
        Err(ScorerError::Session("no model".to_string()))
    });

    let report = run_generate(
        &input,
        &GenerateConfig::default(),
        &mut scorer,
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("run");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, "infer");
    assert!(!dir.path().join("fail_generated.txt").exists());
}

#[test]
fn missing_input_fails_without_progress() {
    let dir = tempdir().expect("tempdir");
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut observer = |e: &ProgressEvent| events.push(*e);
    let mut scorer = sum_scorer();

    let err = run_generate(
        &dir.path().join("absent.txt"),
        &GenerateConfig::default(),
        &mut scorer,
        &mut observer,
        &RunControl::default(),
    )
    .expect_err("missing");
    assert!(matches!(err, GenerateError::Input(InputError::Open { .. })));
    assert!(events.is_empty());
}

#[test]
fn stale_output_is_replaced() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "again.txt", "1 2 3 4\n");
    fs::write(dir.path().join("again_generated.txt"), "stale\nstale\n").expect("stale");
    let mut scorer = sum_scorer();

    run_generate(
        &input,
        &GenerateConfig::default(),
        &mut scorer,
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("run");
    let out = fs::read_to_string(dir.path().join("again_generated.txt")).expect("output");
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("1\t2\t"));
}

#[test]
fn unwritable_output_keeps_the_run_going() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "locked.txt", &rows_input(5));
    // A directory in place of the output file makes every append fail.
    fs::create_dir(dir.path().join("locked_generated.txt")).expect("blocker");
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut observer = |e: &ProgressEvent| events.push(*e);
    let mut calls = 0usize;
    let mut scorer = FnScorer(|input: &Matrix| -> Result<Matrix, ScorerError> {
        calls += 1;
        Ok(Matrix::from_vec(input.rows(), 2, vec![0.5; input.rows() * 2]).expect("shape"))
    });

    let report = run_generate(
        &input,
        &config_with_chunk(2),
        &mut scorer,
        &mut observer,
        &RunControl::default(),
    )
    .expect("run");
    drop(scorer);

    assert_eq!(report.state, PipelineState::Done);
    assert_eq!(report.batches, 3);
    assert_eq!(calls, 3);
    assert_eq!(report.write_failures, report.batches);
    assert_eq!(report.rows_written, 0);
    assert_eq!(report.rows_parsed, 5);
    assert!(report.failures.is_empty());
    assert_eq!(events.len(), 3);
    assert!(dir.path().join("locked_generated.txt").is_dir());
}

#[test]
fn progress_counts_last_line_of_each_full_chunk() {
    let dir = tempdir().expect("tempdir");
    let contents = "1 2 3 4\n5 6 7 8\n9 10 11 12\n13 14 15 16\na\n";
    let input = write_input(dir.path(), "progress.txt", contents);
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut observer = |e: &ProgressEvent| events.push(*e);
    let mut scorer = sum_scorer();

    let report = run_generate(
        &input,
        &config_with_chunk(2),
        &mut scorer,
        &mut observer,
        &RunControl::default(),
    )
    .expect("run");

    let max = contents.len() as u64;
    let got: Vec<(u64, u64)> = events.iter().map(|e| (e.bytes_read, e.max_bytes)).collect();
    assert_eq!(got, vec![(7, max), (18, max), (18, max)]);
    assert_eq!(report.progress.bytes_read, 18);
    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.rows_written, 4);
}

#[test]
fn exact_multiple_of_chunk_emits_final_event() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "even.txt", "1 2 3 4\n5 6 7 8\n");
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut observer = |e: &ProgressEvent| events.push(*e);
    let mut scorer = sum_scorer();

    let report = run_generate(
        &input,
        &config_with_chunk(2),
        &mut scorer,
        &mut observer,
        &RunControl::default(),
    )
    .expect("run");
    assert_eq!(report.batches, 1);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], events[1]);
    assert_eq!(events[1].bytes_read, 7);
}

#[test]
fn chunking_matches_single_batch() {
    let dir = tempdir().expect("tempdir");
    let text = rows_input(23);
    let chunked = write_input(dir.path(), "chunked.txt", &text);
    let whole = write_input(dir.path(), "whole.txt", &text);

    let mut scorer = sum_scorer();
    let report = run_generate(
        &chunked,
        &config_with_chunk(5),
        &mut scorer,
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("chunked");
    assert_eq!(report.batches, 5);

    let mut scorer = sum_scorer();
    let single = run_generate(
        &whole,
        &config_with_chunk(512),
        &mut scorer,
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("whole");
    assert_eq!(single.batches, 1);

    let a = fs::read_to_string(dir.path().join("chunked_generated.txt")).expect("a");
    let b = fs::read_to_string(dir.path().join("whole_generated.txt")).expect("b");
    assert_eq!(a.lines().count(), 23);
    assert_eq!(a, b);
}

#[test]
fn cancelled_run_stops_at_batch_boundary() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "cancel.txt", &rows_input(6));
    let control = RunControl::default();
    let token = control.cancel.clone();
    let mut calls = 0usize;
    let mut scorer = FnScorer(|input: &Matrix| -> Result<Matrix, ScorerError> {
        calls += 1;
        token.cancel();
        Ok(Matrix::from_vec(input.rows(), 2, vec![0.0; input.rows() * 2]).expect("shape"))
    });
    let mut events: Vec<ProgressEvent> = Vec::new();
    let mut observer = |e: &ProgressEvent| events.push(*e);

    let report = run_generate(
        &input,
        &config_with_chunk(2),
        &mut scorer,
        &mut observer,
        &control,
    )
    .expect("run");
    drop(scorer);

    assert_eq!(calls, 1);
    assert_eq!(report.state, PipelineState::Cancelled);
    assert_eq!(report.batches, 1);
    assert_eq!(events.len(), 1);
    assert!(control.cancel.is_cancelled());
}

#[test]
fn validate_parses_without_writing() {
    let dir = tempdir().expect("tempdir");
    let input = write_input(dir.path(), "check.txt", "1 2 3 4\nshort\n5 6 7 8\n");
    let report = run_validate(
        &input,
        &GenerateConfig::default(),
        &mut NoProgress,
        &RunControl::default(),
    )
    .expect("validate");
    assert_eq!(report.rows_parsed, 2);
    assert_eq!(report.rows_skipped, 1);
    assert_eq!(report.rows_written, 0);
    assert!(report.output.is_none());
    assert!(!dir.path().join("check_generated.txt").exists());
}

#[test]
fn terminal_states() {
    assert!(PipelineState::Done.is_terminal());
    assert!(PipelineState::Aborted.is_terminal());
    assert!(PipelineState::Cancelled.is_terminal());
    assert!(!PipelineState::Inferring.is_terminal());
}
