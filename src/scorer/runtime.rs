use std::path::{Path, PathBuf};

use crate::scorer::ScorerError;

const THIRD_PARTY_DIR: &str = "./third_party";

/// File name of the bundled inference runtime for an OS/architecture pair.
pub fn runtime_library_name(os: &str, arch: &str) -> Option<&'static str> {
    match (os, arch) {
        ("windows", "x86_64") => Some("onnxruntime.dll"),
        ("macos", "aarch64") => Some("onnxruntime_arm64.dylib"),
        ("linux", "aarch64") => Some("onnxruntime_arm64.so"),
        ("linux", _) => Some("onnxruntime.so"),
        _ => None,
    }
}

pub fn default_runtime_library() -> Result<PathBuf, ScorerError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    runtime_library_name(os, arch)
        .map(|name| Path::new(THIRD_PARTY_DIR).join(name))
        .ok_or(ScorerError::UnsupportedPlatform { os, arch })
}

/// Explicit override first, then the platform default.
pub fn resolve_runtime_library(explicit: Option<&Path>) -> Result<PathBuf, ScorerError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_runtime_library(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/scorer/runtime.rs"]
mod tests;
