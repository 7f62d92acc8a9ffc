use std::fmt::{self, Write as FmtWrite};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::features::FeatureRow;
use crate::model::prediction::PredictionResult;

const OUTPUT_SUFFIX: &str = "_generated.txt";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot append to {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `my data.txt` -> `my_data_generated.txt`. Spaces are replaced across the whole path.
pub fn output_path_for(input: &Path) -> PathBuf {
    let name = input.to_string_lossy().replace(' ', "_");
    let stem = name.strip_suffix(".txt").unwrap_or(&name);
    PathBuf::from(format!("{stem}{OUTPUT_SUFFIX}"))
}

/// Removes a previous run's output. Returns whether a file was deleted.
pub fn remove_stale_output(path: &Path) -> bool {
    std::fs::remove_file(path).is_ok()
}

/// Six fixed decimals; non-finite values print as `+Inf`, `-Inf` and `NaN`.
struct Fixed6(f32);

impl fmt::Display for Fixed6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("NaN")
        } else if v == f32::INFINITY {
            f.write_str("+Inf")
        } else if v == f32::NEG_INFINITY {
            f.write_str("-Inf")
        } else {
            write!(f, "{v:.6}")
        }
    }
}

pub fn format_line(out: &mut String, row: &FeatureRow, prediction: &PredictionResult) {
    let _ = writeln!(
        out,
        "{}\t{}\t{}\t{}\t{}\t{}",
        row.p(),
        row.q(),
        Fixed6(row.theta()),
        Fixed6(row.phi()),
        Fixed6(prediction.real),
        Fixed6(prediction.imag)
    );
}

pub fn format_lines(rows: &[FeatureRow], predictions: &[PredictionResult]) -> String {
    debug_assert_eq!(rows.len(), predictions.len());
    let mut out = String::with_capacity(rows.len() * 48);
    for (row, prediction) in rows.iter().zip(predictions) {
        format_line(&mut out, row, prediction);
    }
    out
}

/// Opens, appends and closes `path` in a single write.
pub fn append_to_file(path: &Path, text: &str) -> Result<(), WriteError> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let wrap = |source| WriteError::Append {
        path: path.to_path_buf(),
        source,
    };
    let mut file = options.open(path).map_err(wrap)?;
    file.write_all(text.as_bytes()).map_err(wrap)?;
    Ok(())
}

/// Writes the raw rows next to their predictions. Returns the number of lines written.
pub fn run_stage4_write(
    out_path: &Path,
    rows: &[FeatureRow],
    predictions: &[PredictionResult],
) -> Result<usize, WriteError> {
    if rows.is_empty() {
        return Ok(0);
    }
    let text = format_lines(rows, predictions);
    append_to_file(out_path, &text)?;
    Ok(rows.len().min(predictions.len()))
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_write.rs"]
mod tests;
