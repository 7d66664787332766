//! Input and output plumbing shared by the converter commands.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::content::SourceMode;
use crate::log;

/// `-` as a file argument means stdin.
fn is_stdin(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

/// Read a file, or stdin when `path` is `None` or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if !is_stdin(Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Write `text` to a file, or stdout when `path` is `None`.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    let text = if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    };

    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create `{}`", parent.display()))?;
            }
            fs::write(path, text).with_context(|| format!("failed to write `{}`", path.display()))?;
            log!("write"; "{}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// HTML for `.html`/`.htm` inputs, Markdown otherwise.
pub fn source_mode_for(path: Option<&Path>) -> SourceMode {
    let is_html = path
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    if is_html { SourceMode::Html } else { SourceMode::Markdown }
}

/// File stem of an input path; `None` for stdin.
pub fn input_stem(path: Option<&Path>) -> Option<String> {
    if is_stdin(path) {
        return None;
    }
    path?.file_stem().map(|s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_source_mode_for() {
        assert_eq!(source_mode_for(Some(Path::new("a.HTML"))), SourceMode::Html);
        assert_eq!(source_mode_for(Some(Path::new("a.htm"))), SourceMode::Html);
        assert_eq!(source_mode_for(Some(Path::new("a.md"))), SourceMode::Markdown);
        assert_eq!(source_mode_for(None), SourceMode::Markdown);
    }

    #[test]
    fn test_input_stem() {
        assert_eq!(input_stem(Some(Path::new("dir/post.html"))).as_deref(), Some("post"));
        assert_eq!(input_stem(Some(Path::new("-"))), None);
        assert_eq!(input_stem(None), None);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let out: PathBuf = dir.path().join("nested/out.md");
        write_output(Some(&out), "text").unwrap();
        assert_eq!(read_input(Some(&out)).unwrap(), "text\n");
        assert!(read_input(Some(&dir.path().join("missing"))).is_err());
    }
}
