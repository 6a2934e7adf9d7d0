//! Descriptor file discovery and loading

use crate::descriptor::ConfigDescriptor;
use crate::error::{DescriptorError, Result};
use std::path::{Path, PathBuf};

/// Locations searched, relative to the project directory, in order.
pub const DESCRIPTOR_CANDIDATES: [&str; 3] = [
    "buildspec.toml",
    "app/buildspec.toml",
    ".config/buildspec.toml",
];

/// Read and load a descriptor file.
pub fn load_file(path: &Path) -> Result<ConfigDescriptor> {
    let source = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "Read build descriptor");
    ConfigDescriptor::load(&source)
}

/// Find the descriptor in standard locations under `dir`.
pub fn find_descriptor(dir: &Path) -> Option<PathBuf> {
    DESCRIPTOR_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}
