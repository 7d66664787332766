//! Path utilities.
//!
//! - `normalize_path` - absolute form (canonicalize + fallback)
//! - `checked_file_name` - reject names that could leave their directory
//! - `unique_file_name` - `name.ext`, `name-1.ext`, ... first free slot

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first, falls back to joining with the current
/// directory for paths that do not exist yet.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Accept a bare file name: non-empty, no separators, no `..`, no leading dot.
pub fn checked_file_name(name: &str) -> Option<&str> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..");
    valid.then_some(name)
}

/// First free file name in `dir` starting from `name`.
///
/// `post.html` → `post.html`, `post-1.html`, `post-2.html`, ...
pub fn unique_file_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    (1..)
        .map(|n| match ext {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        })
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| name.to_string())
}
