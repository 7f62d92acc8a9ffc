#[cfg(feature = "onnx")]
pub mod onnx;
pub mod runtime;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::matrix::Matrix;

pub const DEFAULT_MODEL_PATH: &str = "./third_party/autoencoder2_freezed.onnx";

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("no inference runtime library known for os \"{os}\" and architecture \"{arch}\"")]
    UnsupportedPlatform {
        os: &'static str,
        arch: &'static str,
    },
    #[error("cannot load inference runtime from {path}: {reason}")]
    RuntimeLibrary { path: PathBuf, reason: String },
    #[error("model artifact not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("error creating network session: {0}")]
    Session(String),
    #[error("error running the network: {0}")]
    Invocation(String),
    #[error("scorer backend \"{0}\" is not compiled into this build")]
    BackendUnavailable(&'static str),
}

/// Maps a batch of normalized feature rows to `(real, imag)` pairs.
///
/// Implementations receive an `(N, 4)` matrix and must return an `(N, 2)`
/// matrix in the same row order. Any external resources a call needs are
/// acquired and released within that call unless the implementation
/// documents otherwise.
pub trait Scorer {
    fn score(&mut self, input: &Matrix) -> Result<Matrix, ScorerError>;
}

impl<S: Scorer + ?Sized> Scorer for Box<S> {
    fn score(&mut self, input: &Matrix) -> Result<Matrix, ScorerError> {
        (**self).score(input)
    }
}

impl<S: Scorer + ?Sized> Scorer for &mut S {
    fn score(&mut self, input: &Matrix) -> Result<Matrix, ScorerError> {
        (**self).score(input)
    }
}

/// Adapts a closure into a [`Scorer`].
pub struct FnScorer<F>(pub F);

impl<F> Scorer for FnScorer<F>
where
    F: FnMut(&Matrix) -> Result<Matrix, ScorerError>,
{
    fn score(&mut self, input: &Matrix) -> Result<Matrix, ScorerError> {
        (self.0)(input)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScorerConfig {
    /// Path to the ONNX model artifact.
    pub model: PathBuf,
    /// Overrides the platform default from [`runtime::default_runtime_library`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_library: Option<PathBuf>,
    pub input_name: String,
    pub output_name: String,
    /// Keep one session alive for the whole run instead of one per batch.
    pub reuse_session: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from(DEFAULT_MODEL_PATH),
            runtime_library: None,
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            reuse_session: false,
        }
    }
}

pub fn backend_name() -> &'static str {
    if cfg!(feature = "onnx") { "onnx" } else { "none" }
}

/// Builds the scorer compiled into this binary.
pub fn build_scorer(config: &ScorerConfig) -> Result<Box<dyn Scorer>, ScorerError> {
    #[cfg(feature = "onnx")]
    {
        return Ok(Box::new(onnx::OnnxScorer::new(config)?));
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = config;
        Err(ScorerError::BackendUnavailable("onnx"))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/scorer/mod.rs"]
mod tests;
