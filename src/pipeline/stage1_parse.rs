use thiserror::Error;

use crate::input::lines::LineChunk;
use crate::model::features::{Batch, FEATURE_WIDTH, FeatureRow};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error parsing input value \"{value}\" at line {line}: {reason}")]
    InvalidValue {
        line: usize,
        value: String,
        reason: String,
    },
}

/// Parses one line. Lines with fewer than [`FEATURE_WIDTH`] fields yield `Ok(None)`;
/// fields past the first four are ignored.
pub fn parse_line(text: &str, line: usize) -> Result<Option<FeatureRow>, ParseError> {
    let fields: Vec<&str> = text.split_whitespace().take(FEATURE_WIDTH).collect();
    if fields.len() < FEATURE_WIDTH {
        return Ok(None);
    }

    let mut values = [0.0f32; FEATURE_WIDTH];
    for (slot, field) in values.iter_mut().zip(fields) {
        let value = field
            .parse::<f32>()
            .map_err(|e| ParseError::InvalidValue {
                line,
                value: field.to_string(),
                reason: e.to_string(),
            })?;
        if !value.is_finite() {
            return Err(ParseError::InvalidValue {
                line,
                value: field.to_string(),
                reason: "value is not a finite number".to_string(),
            });
        }
        *slot = value;
    }
    Ok(Some(FeatureRow(values)))
}

/// Parses a run of lines starting at 1-based line `first_line`.
/// The first bad value fails the whole batch.
pub fn parse_batch<S: AsRef<str>>(lines: &[S], first_line: usize) -> Result<Batch, ParseError> {
    let mut batch = Batch {
        rows: Vec::with_capacity(lines.len()),
        skipped: 0,
    };
    for (offset, text) in lines.iter().enumerate() {
        match parse_line(text.as_ref(), first_line + offset)? {
            Some(row) => batch.rows.push(row),
            None => batch.skipped += 1,
        }
    }
    Ok(batch)
}

pub fn run_stage1_parse(chunk: &LineChunk) -> Result<Batch, ParseError> {
    parse_batch(&chunk.lines, chunk.first_line)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_parse.rs"]
mod tests;
