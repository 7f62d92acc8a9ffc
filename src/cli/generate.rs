use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use serde_json::json;
use tracing::{info, warn};

use crate::cli::config::ConfigArgs;
use crate::pipeline::stage5_progress::{NoProgress, PROGRESS_EVENT, ProgressEvent, ProgressObserver};
use crate::pipeline::{CancelToken, FailurePolicy, PipelineState, RunControl, run_generate};
use crate::report::json::write_summary;
use crate::report::text::render_report;
use crate::scorer::build_scorer;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Input text files, processed in order
    #[arg(required = true)]
    pub(crate) files: Vec<PathBuf>,

    #[command(flatten)]
    pub(crate) config: ConfigArgs,

    /// Stop at the first batch that fails to parse or score
    #[arg(long)]
    pub(crate) strict: bool,

    /// How progress events are published
    #[arg(long, value_enum, default_value = "log")]
    pub(crate) progress: ProgressMode,

    /// Write all run reports to this JSON file
    #[arg(long)]
    pub(crate) summary: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressMode {
    /// One `info` log event per progress event
    Log,
    /// One `{"event":"generate",...}` JSON line per event on stdout
    Json,
    /// Progress is not published
    None,
}

impl ProgressMode {
    pub(crate) fn observer(self) -> Box<dyn ProgressObserver> {
        match self {
            ProgressMode::Log => Box::new(log_observer),
            ProgressMode::Json => Box::new(json_lines_observer(std::io::stdout())),
            ProgressMode::None => Box::new(NoProgress),
        }
    }
}

fn log_observer(event: &ProgressEvent) {
    info!(
        event = PROGRESS_EVENT,
        bytes_read = event.bytes_read,
        max_bytes = event.max_bytes,
        "progress"
    );
}

pub(crate) fn json_lines_observer<W: Write>(mut out: W) -> impl FnMut(&ProgressEvent) {
    move |event: &ProgressEvent| {
        let line = json!({
            "event": PROGRESS_EVENT,
            "bytesRead": event.bytes_read,
            "maxBytes": event.max_bytes,
        });
        // A lost progress line never fails the run.
        let _ = writeln!(out, "{line}").and_then(|_| out.flush());
    }
}

pub(crate) fn policy(strict: bool) -> FailurePolicy {
    if strict {
        FailurePolicy::Strict
    } else {
        FailurePolicy::SkipBatch
    }
}

/// Cancels `token` on Ctrl-C. The run stops before its next batch.
///
/// Only one handler can exist per process; a second install is logged and ignored.
pub(crate) fn cancel_on_interrupt(token: &CancelToken) {
    let token = token.clone();
    let installed = ctrlc::set_handler(move || {
        info!("interrupt received, stopping after the current batch");
        token.cancel();
    });
    if let Err(e) = installed {
        warn!(error = %e, "interrupt handler not installed");
    }
}

pub fn handle(args: GenerateArgs) -> anyhow::Result<()> {
    let config = args.config.resolve()?;
    let mut scorer = build_scorer(&config.scorer)?;
    let mut observer = args.progress.observer();
    let control = RunControl {
        policy: policy(args.strict),
        cancel: CancelToken::new(),
    };
    cancel_on_interrupt(&control.cancel);

    let total = args.files.len();
    let mut reports = Vec::with_capacity(total);
    for (index, file) in args.files.iter().enumerate() {
        let start = Instant::now();
        info!(stage = "generate", file = %file.display(), "starting file");
        match run_generate(file, &config, scorer.as_mut(), observer.as_mut(), &control) {
            Ok(report) => {
                info!(
                    stage = "generate",
                    elapsed_ms = start.elapsed().as_millis(),
                    rows_written = report.rows_written,
                    "finished file"
                );
                if args.progress != ProgressMode::Json {
                    print!("{}", render_report(&report));
                }
                let cancelled = report.state == PipelineState::Cancelled;
                reports.push(report);
                if cancelled {
                    warn!(files_left = total - index - 1, "run cancelled");
                    break;
                }
            }
            Err(e) if control.policy == FailurePolicy::Strict => {
                return Err(anyhow::Error::new(e).context(format!("generating from {}", file.display())));
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "file skipped");
            }
        }
        info!(
            files_done = index + 1,
            files = total,
            overall_percent = (index + 1) * 100 / total,
            "overall progress"
        );
    }

    if let Some(path) = &args.summary {
        write_summary(path, &reports)?;
    }
    Ok(())
}
