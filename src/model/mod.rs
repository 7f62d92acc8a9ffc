pub mod features;
pub mod matrix;
pub mod normalization;
pub mod prediction;
