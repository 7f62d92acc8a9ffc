/// Number of feature columns consumed per input line.
pub const FEATURE_WIDTH: usize = 4;

/// Default number of raw lines grouped into one batch.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// One parsed input line: `p q theta phi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow(pub [f32; FEATURE_WIDTH]);

impl FeatureRow {
    pub fn values(&self) -> &[f32; FEATURE_WIDTH] {
        &self.0
    }

    pub fn p(&self) -> i32 {
        self.0[0] as i32
    }

    pub fn q(&self) -> i32 {
        self.0[1] as i32
    }

    pub fn theta(&self) -> f32 {
        self.0[2]
    }

    pub fn phi(&self) -> f32 {
        self.0[3]
    }
}

impl From<[f32; FEATURE_WIDTH]> for FeatureRow {
    fn from(value: [f32; FEATURE_WIDTH]) -> Self {
        Self(value)
    }
}

/// Rows parsed from a single chunk, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub rows: Vec<FeatureRow>,
    /// Lines of the chunk that had fewer than [`FEATURE_WIDTH`] fields.
    pub skipped: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureRow> {
        self.rows.iter()
    }
}
