use crate::model::features::{Batch, FeatureRow};
use crate::model::normalization::NormalizationParams;

/// Normalized copy of a batch. The raw rows are kept for the result writer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub rows: Vec<FeatureRow>,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn run_stage2_normalize(batch: &Batch, params: &NormalizationParams) -> NormalizedBatch {
    debug_assert!(
        params.degenerate_column().is_none(),
        "normalization parameters must be validated before use"
    );
    NormalizedBatch {
        rows: batch.iter().map(|row| params.normalize(row)).collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_normalize.rs"]
mod tests;
