//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use super::router::url_path;

/// Resolve a URL to a file under `root`, using `index.html` for directories.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;
    if clean.split('/').any(|part| part == "..") {
        return None;
    }

    // Symlinks and encoded separators must not escape the root.
    let canonical = root.join(&clean).canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}

/// Decoded path with query and surrounding slashes removed.
fn normalize_url(url: &str) -> Option<String> {
    let decoded = percent_decode_str(url_path(url)).decode_utf8().ok()?;
    Some(decoded.trim_matches('/').to_string())
}
