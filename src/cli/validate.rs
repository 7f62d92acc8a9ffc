use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::{info, warn};

use crate::cli::config::ConfigArgs;
use crate::cli::generate::{cancel_on_interrupt, policy};
use crate::pipeline::stage5_progress::NoProgress;
use crate::pipeline::{CancelToken, FailurePolicy, PipelineState, RunControl, run_validate};
use crate::report::json::write_summary;
use crate::report::text::render_report;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input text files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,

    /// Stop at the first batch that fails to parse
    #[arg(long)]
    strict: bool,

    /// Write all run reports to this JSON file
    #[arg(long)]
    summary: Option<PathBuf>,
}

pub fn handle(args: ValidateArgs) -> anyhow::Result<()> {
    let config = args.config.resolve()?;
    let control = RunControl {
        policy: policy(args.strict),
        cancel: CancelToken::new(),
    };
    cancel_on_interrupt(&control.cancel);

    let mut reports = Vec::with_capacity(args.files.len());
    let mut failed_batches = 0usize;
    let mut unreadable = 0usize;
    for file in &args.files {
        let start = Instant::now();
        info!(stage = "validate", file = %file.display(), "starting file");
        let report = match run_validate(file, &config, &mut NoProgress, &control) {
            Ok(report) => report,
            Err(e) if control.policy == FailurePolicy::Strict => {
                return Err(anyhow::Error::new(e).context(format!("validating {}", file.display())));
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "file skipped");
                unreadable += 1;
                continue;
            }
        };
        info!(
            stage = "validate",
            elapsed_ms = start.elapsed().as_millis(),
            rows = report.rows_parsed,
            skipped = report.rows_skipped,
            "finished file"
        );
        print!("{}", render_report(&report));
        failed_batches += report.failures.len();
        let cancelled = report.state == PipelineState::Cancelled;
        reports.push(report);
        if cancelled {
            break;
        }
    }

    if let Some(path) = &args.summary {
        write_summary(path, &reports)?;
    }
    if unreadable > 0 {
        anyhow::bail!("{unreadable} input files could not be read");
    }
    if failed_batches > 0 {
        warn!(failed_batches, "validation found unparseable batches");
        anyhow::bail!("{failed_batches} batches failed to parse");
    }
    Ok(())
}
