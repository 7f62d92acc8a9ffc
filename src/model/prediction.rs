use serde::{Deserialize, Serialize};

/// Complex-valued model output for one feature row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub real: f32,
    pub imag: f32,
}

impl PredictionResult {
    pub fn new(real: f32, imag: f32) -> Self {
        Self { real, imag }
    }
}
