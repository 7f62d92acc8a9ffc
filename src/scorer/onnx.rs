use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use crate::model::matrix::Matrix;
use crate::scorer::runtime::resolve_runtime_library;
use crate::scorer::{Scorer, ScorerConfig, ScorerError};

static ORT_ENV: OnceLock<Result<(), String>> = OnceLock::new();

fn init_runtime(library: &Path) -> Result<(), ScorerError> {
    let state = ORT_ENV.get_or_init(|| {
        if !library.is_file() {
            return Err("library file not found".to_string());
        }
        match ort::init_from(library.to_string_lossy().into_owned()) {
            Ok(builder) => {
                let _ = builder.with_name("harmonics").commit();
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    });
    state
        .clone()
        .map_err(|reason| ScorerError::RuntimeLibrary {
            path: library.to_path_buf(),
            reason,
        })
}

/// Scores batches with an ONNX model through a dynamically loaded onnxruntime.
///
/// By default a session is created for every call and dropped before the call
/// returns. With `reuse_session` the first session is kept for later calls.
pub struct OnnxScorer {
    library: PathBuf,
    config: ScorerConfig,
    cached: Option<Session>,
}

impl OnnxScorer {
    pub fn new(config: &ScorerConfig) -> Result<Self, ScorerError> {
        let library = resolve_runtime_library(config.runtime_library.as_deref())?;
        Ok(Self {
            library,
            config: config.clone(),
            cached: None,
        })
    }

    fn open_session(&self) -> Result<Session, ScorerError> {
        if !self.config.model.is_file() {
            return Err(ScorerError::ModelNotFound(self.config.model.clone()));
        }
        debug!(model = %self.config.model.display(), "opening inference session");
        Session::builder()
            .and_then(|builder| builder.commit_from_file(&self.config.model))
            .map_err(|e| ScorerError::Session(e.to_string()))
    }
}

impl Scorer for OnnxScorer {
    fn score(&mut self, input: &Matrix) -> Result<Matrix, ScorerError> {
        init_runtime(&self.library)?;

        if self.config.reuse_session {
            let session = match self.cached.take() {
                Some(session) => session,
                None => self.open_session()?,
            };
            let session = self.cached.insert(session);
            return run_session(
                session,
                &self.config.input_name,
                &self.config.output_name,
                input,
            );
        }

        let mut session = self.open_session()?;
        run_session(
            &mut session,
            &self.config.input_name,
            &self.config.output_name,
            input,
        )
    }
}

fn run_session(
    session: &mut Session,
    input_name: &str,
    output_name: &str,
    input: &Matrix,
) -> Result<Matrix, ScorerError> {
    let rows = input.rows();
    let tensor = Tensor::from_array(([rows, input.cols()], input.as_slice().to_vec()))
        .map_err(|e| ScorerError::Invocation(format!("error creating input tensor: {e}")))?;

    let outputs = session
        .run(ort::inputs![input_name => tensor])
        .map_err(|e| ScorerError::Invocation(e.to_string()))?;
    let output = outputs
        .get(output_name)
        .ok_or_else(|| ScorerError::Invocation(format!("model has no output \"{output_name}\"")))?;
    let (_shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| ScorerError::Invocation(format!("error reading output tensor: {e}")))?;

    let cols = if rows == 0 { 0 } else { data.len() / rows };
    Matrix::from_vec(rows, cols, data.to_vec()).ok_or_else(|| {
        ScorerError::Invocation(format!(
            "output of {} values does not split into {rows} rows",
            data.len()
        ))
    })
}
