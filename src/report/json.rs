use std::path::Path;

use crate::pipeline::RunReport;

pub fn write_summary(path: &Path, reports: &[RunReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(reports)?;
    std::fs::write(path, json)?;
    Ok(())
}
