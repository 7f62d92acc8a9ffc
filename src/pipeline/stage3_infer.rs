use thiserror::Error;

use crate::model::features::{FEATURE_WIDTH, FeatureRow};
use crate::model::matrix::Matrix;
use crate::model::prediction::PredictionResult;
use crate::pipeline::stage2_normalize::NormalizedBatch;
use crate::scorer::{Scorer, ScorerError};

/// Values produced by the scorer per row: real and imaginary part.
pub const OUTPUT_WIDTH: usize = 2;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("scorer error: {0}")]
    Scorer(#[from] ScorerError),
    #[error("scorer returned a {found_rows}x{found_cols} matrix, expected {expected_rows}x{OUTPUT_WIDTH}")]
    OutputShape {
        expected_rows: usize,
        found_rows: usize,
        found_cols: usize,
    },
}

/// Packs rows row-major into an `(N, 4)` matrix.
pub fn pack_rows(rows: &[FeatureRow]) -> Matrix {
    let values: Vec<[f32; FEATURE_WIDTH]> = rows.iter().map(|r| r.0).collect();
    Matrix::from_rows(&values)
}

/// Splits an `(N, 2)` matrix into `(real, imag)` pairs.
pub fn unpack_pairs(output: &Matrix) -> Vec<PredictionResult> {
    output
        .iter_rows()
        .map(|pair| PredictionResult::new(pair[0], pair[1]))
        .collect()
}

pub fn run_stage3_infer<S: Scorer + ?Sized>(
    batch: &NormalizedBatch,
    scorer: &mut S,
) -> Result<Vec<PredictionResult>, AdapterError> {
    let input = pack_rows(&batch.rows);
    let output = scorer.score(&input)?;
    if output.rows() != batch.len() || output.cols() != OUTPUT_WIDTH {
        return Err(AdapterError::OutputShape {
            expected_rows: batch.len(),
            found_rows: output.rows(),
            found_cols: output.cols(),
        });
    }
    Ok(unpack_pairs(&output))
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_infer.rs"]
mod tests;
