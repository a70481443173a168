//! Helpers for deriving output names from imaging file paths.

use std::path::{Path, PathBuf};

/// Compression suffixes that are kept together with the extension before them.
const COMPRESSION_SUFFIXES: [&str; 6] = [".gz", ".bzip", ".bzip2", ".bz2", ".zip", ".xz"];

/// Returns the extension of `path`, including a trailing compression suffix.
///
/// ```
/// use neuroflow::utils::compound_extension;
///
/// assert_eq!(compound_extension("sub01/head.nii.gz"), ".nii.gz");
/// assert_eq!(compound_extension("brain.nii"), ".nii");
/// assert_eq!(compound_extension("README"), "");
/// ```
#[must_use]
pub fn compound_extension(path: impl AsRef<Path>) -> String {
    let Some(name) = path.as_ref().file_name().and_then(|n| n.to_str()) else {
        return String::new();
    };

    let suffix = simple_extension(name);
    if COMPRESSION_SUFFIXES.contains(&suffix) {
        let inner = &name[..name.len() - suffix.len()];
        return format!("{}{}", simple_extension(inner), suffix);
    }
    suffix.to_string()
}

/// Removes the compound extension from `path`.
///
/// `/data/sub01/brain.nii.gz` becomes `/data/sub01/brain`.
#[must_use]
pub fn strip_extension(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let ext = compound_extension(path);
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if !ext.is_empty() => path.with_file_name(&name[..name.len() - ext.len()]),
        _ => path.to_path_buf(),
    }
}

/// Returns `prefix` with `suffix` appended to its file name.
///
/// Used to build sibling outputs such as `brain_mask_axial.png` from
/// `brain_mask`.
#[must_use]
pub fn with_suffix(prefix: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let prefix = prefix.as_ref();
    let mut name = prefix.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    prefix.with_file_name(name)
}

// `.bashrc` has no extension; the leading dot is part of the name.
fn simple_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}
