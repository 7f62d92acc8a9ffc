pub mod cli;
pub mod config;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod scorer;

pub mod prelude {
    pub use crate::config::GenerateConfig;
    pub use crate::model::features::{Batch, FEATURE_WIDTH, FeatureRow};
    pub use crate::model::normalization::NormalizationParams;
    pub use crate::model::prediction::PredictionResult;
    pub use crate::pipeline::stage5_progress::{ProgressEvent, ProgressObserver};
    pub use crate::pipeline::{CancelToken, FailurePolicy, RunReport, run_generate};
    pub use crate::scorer::{Scorer, ScorerError};
}
