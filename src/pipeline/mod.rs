pub mod stage1_parse;
pub mod stage2_normalize;
pub mod stage3_infer;
pub mod stage4_write;
pub mod stage5_progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::GenerateConfig;
use crate::input::InputError;
use crate::input::lines::{LineChunk, LineSource};
use crate::pipeline::stage1_parse::{ParseError, run_stage1_parse};
use crate::pipeline::stage2_normalize::run_stage2_normalize;
use crate::pipeline::stage3_infer::{AdapterError, run_stage3_infer};
use crate::pipeline::stage4_write::{output_path_for, remove_stale_output, run_stage4_write};
use crate::pipeline::stage5_progress::{ProgressObserver, ProgressState, run_stage5_progress};
use crate::scorer::Scorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Reading,
    Parsing,
    Normalizing,
    Inferring,
    Writing,
    Reporting,
    Done,
    Aborted,
    Cancelled,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Reading => "reading",
            PipelineState::Parsing => "parsing",
            PipelineState::Normalizing => "normalizing",
            PipelineState::Inferring => "inferring",
            PipelineState::Writing => "writing",
            PipelineState::Reporting => "reporting",
            PipelineState::Done => "done",
            PipelineState::Aborted => "aborted",
            PipelineState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Aborted | PipelineState::Cancelled
        )
    }
}

/// What to do when a batch fails to parse or score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Drop the batch, keep going with the next one.
    #[default]
    SkipBatch,
    /// Stop the run on the first failed batch.
    Strict,
}

/// Cooperative cancellation flag, checked before each batch is read.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub policy: FailurePolicy,
    pub cancel: CancelToken,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl BatchError {
    pub fn stage(&self) -> &'static str {
        match self {
            BatchError::Parse(_) => "parse",
            BatchError::Adapter(_) => "infer",
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("batch {batch} failed during {}: {source}", .source.stage())]
    Batch { batch: usize, source: BatchError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub batch: usize,
    pub first_line: usize,
    pub stage: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: PathBuf,
    /// `None` for dry runs.
    pub output: Option<PathBuf>,
    pub batches: usize,
    pub lines_read: usize,
    pub rows_parsed: usize,
    pub rows_skipped: usize,
    pub rows_written: usize,
    pub progress: ProgressState,
    pub failures: Vec<BatchFailure>,
    pub write_failures: usize,
    pub state: PipelineState,
}

impl RunReport {
    fn new(input: &Path, output: Option<PathBuf>) -> Self {
        Self {
            input: input.to_path_buf(),
            output,
            batches: 0,
            lines_read: 0,
            rows_parsed: 0,
            rows_skipped: 0,
            rows_written: 0,
            progress: ProgressState::default(),
            failures: Vec::new(),
            write_failures: 0,
            state: PipelineState::Idle,
        }
    }

    fn enter(&mut self, state: PipelineState) {
        trace!(state = state.as_str(), batch = self.batches, "pipeline state");
        self.state = state;
    }
}

/// Reads `input` in chunks of `config.batch.chunk_size` lines, scores every
/// parsed row and appends the results to the `_generated.txt` file next to it.
///
/// A previous output file is removed first. Progress is reported after every
/// full chunk and once more at end of input. Failed batches are recorded in
/// the report and skipped unless `control.policy` is [`FailurePolicy::Strict`].
/// Write failures are always recorded and skipped.
pub fn run_generate(
    input: &Path,
    config: &GenerateConfig,
    scorer: &mut dyn Scorer,
    observer: &mut dyn ProgressObserver,
    control: &RunControl,
) -> Result<RunReport, GenerateError> {
    let out_path = output_path_for(input);
    if remove_stale_output(&out_path) {
        debug!(output = %out_path.display(), "removed previous output");
    }
    drive(
        input,
        config,
        Some((scorer, out_path.as_path())),
        observer,
        control,
    )
}

/// Parses and normalizes `input` without scoring or writing anything.
pub fn run_validate(
    input: &Path,
    config: &GenerateConfig,
    observer: &mut dyn ProgressObserver,
    control: &RunControl,
) -> Result<RunReport, GenerateError> {
    drive(input, config, None, observer, control)
}

fn drive(
    input: &Path,
    config: &GenerateConfig,
    mut sink: Option<(&mut dyn Scorer, &Path)>,
    observer: &mut dyn ProgressObserver,
    control: &RunControl,
) -> Result<RunReport, GenerateError> {
    let chunk_size = config.batch.chunk_size.max(1);
    let mut report = RunReport::new(input, sink.as_ref().map(|(_, p)| p.to_path_buf()));

    let mut source = LineSource::open(input)?;
    let mut progress = ProgressState::new(source.total_bytes());
    report.progress = progress;
    info!(
        input = %input.display(),
        max_bytes = progress.max_bytes,
        chunk_size,
        "generating from file"
    );

    loop {
        if control.cancel.is_cancelled() {
            report.enter(PipelineState::Cancelled);
            info!(batches = report.batches, "run cancelled");
            return Ok(report);
        }

        report.enter(PipelineState::Reading);
        let chunk = match source.next_chunk(chunk_size) {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                report.enter(PipelineState::Aborted);
                return Err(e.into());
            }
        };
        let full = chunk.len() == chunk_size;
        let batch_idx = report.batches;
        report.batches += 1;
        report.lines_read += chunk.len();

        let sink = sink
            .as_mut()
            .map(|(scorer, path)| (&mut **scorer as &mut dyn Scorer, *path));
        if let Err(e) = process_chunk(&chunk, config, sink, &mut report) {
            warn!(
                batch = batch_idx,
                first_line = chunk.first_line,
                stage = e.stage(),
                error = %e,
                "batch dropped"
            );
            report.failures.push(BatchFailure {
                batch: batch_idx,
                first_line: chunk.first_line,
                stage: e.stage(),
                message: e.to_string(),
            });
            if control.policy == FailurePolicy::Strict {
                report.enter(PipelineState::Aborted);
                return Err(GenerateError::Batch {
                    batch: batch_idx,
                    source: e,
                });
            }
        }

        if !full {
            break;
        }
        report.enter(PipelineState::Reporting);
        progress.advance(chunk.last_line_bytes);
        report.progress = progress;
        info!(
            lines = report.lines_read,
            bytes_read = progress.bytes_read,
            "generated lines"
        );
        run_stage5_progress(&progress, observer);
    }

    // The end-of-input event repeats the last count; no bytes are added for it.
    report.enter(PipelineState::Reporting);
    report.progress = progress;
    run_stage5_progress(&progress, observer);

    report.enter(PipelineState::Done);
    info!(
        input = %input.display(),
        lines = report.lines_read,
        rows_written = report.rows_written,
        failures = report.failures.len(),
        "finished generating from file"
    );
    Ok(report)
}

fn process_chunk(
    chunk: &LineChunk,
    config: &GenerateConfig,
    sink: Option<(&mut dyn Scorer, &Path)>,
    report: &mut RunReport,
) -> Result<(), BatchError> {
    report.enter(PipelineState::Parsing);
    let batch = run_stage1_parse(chunk)?;
    report.rows_parsed += batch.len();
    report.rows_skipped += batch.skipped;
    if batch.is_empty() {
        return Ok(());
    }

    report.enter(PipelineState::Normalizing);
    let normalized = run_stage2_normalize(&batch, &config.normalization);

    let Some((scorer, out_path)) = sink else {
        return Ok(());
    };

    report.enter(PipelineState::Inferring);
    let predictions = run_stage3_infer(&normalized, scorer)?;

    report.enter(PipelineState::Writing);
    match run_stage4_write(out_path, &batch.rows, &predictions) {
        Ok(written) => report.rows_written += written,
        Err(e) => {
            warn!(error = %e, "result append failed");
            report.write_failures += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
