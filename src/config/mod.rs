pub mod loader;

use serde::{Deserialize, Serialize};

use crate::model::features::DEFAULT_CHUNK_SIZE;
use crate::model::normalization::NormalizationParams;
use crate::scorer::ScorerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    pub batch: BatchConfig,
    pub normalization: NormalizationParams,
    pub scorer: ScorerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub chunk_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}
