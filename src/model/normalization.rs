use serde::{Deserialize, Serialize};

use crate::model::features::{FEATURE_WIDTH, FeatureRow};

pub const DEFAULT_MEAN: [f32; FEATURE_WIDTH] = [23.06966, -0.00452, 1.5650475, 3.119159];
pub const DEFAULT_STD: [f32; FEATURE_WIDTH] = [8.339648, 14.216207, 0.92338675, 1.8202546];

/// Per-column mean and standard deviation used to rescale features before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationParams {
    pub mean: [f32; FEATURE_WIDTH],
    pub std: [f32; FEATURE_WIDTH],
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self {
            mean: DEFAULT_MEAN,
            std: DEFAULT_STD,
        }
    }
}

impl NormalizationParams {
    /// Returns the index of the first column whose deviation cannot be divided by.
    pub fn degenerate_column(&self) -> Option<usize> {
        self.std
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
            .or_else(|| self.mean.iter().position(|m| !m.is_finite()))
    }

    pub fn normalize(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = row.0;
        for (j, value) in out.iter_mut().enumerate() {
            *value = (*value - self.mean[j]) / self.std[j];
        }
        FeatureRow(out)
    }

    pub fn denormalize(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = row.0;
        for (j, value) in out.iter_mut().enumerate() {
            *value = *value * self.std[j] + self.mean[j];
        }
        FeatureRow(out)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/normalization.rs"]
mod tests;
