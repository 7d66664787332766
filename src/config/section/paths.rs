//! `[paths]` section configuration.
//!
//! All paths are relative to the directory holding `blog.toml`.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! blog = "blog"                 # published post pages
//! images = "blog-img"           # covers and uploaded images
//! drafts = "drafts"             # draft JSON files
//! index = "blog.html"           # blog index page with the post grid
//! template = "post.html"        # optional, embedded template when absent
//! static_root = "."             # served for non-API requests
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;

/// Site directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub blog: PathBuf,
    pub images: PathBuf,
    pub drafts: PathBuf,
    pub index: PathBuf,
    pub template: Option<PathBuf>,
    pub static_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            blog: "blog".into(),
            images: "blog-img".into(),
            drafts: "drafts".into(),
            index: "blog.html".into(),
            template: None,
            static_root: ".".into(),
        }
    }
}

impl PathsConfig {
    fn fields(&self) -> [(FieldPath, Option<&Path>); 6] {
        [
            (FieldPath::new("paths.blog"), Some(self.blog.as_path())),
            (FieldPath::new("paths.images"), Some(self.images.as_path())),
            (FieldPath::new("paths.drafts"), Some(self.drafts.as_path())),
            (FieldPath::new("paths.index"), Some(self.index.as_path())),
            (FieldPath::new("paths.template"), self.template.as_deref()),
            (FieldPath::new("paths.static_root"), Some(self.static_root.as_path())),
        ]
    }

    /// Check raw paths before they are joined with the root.
    pub fn validate_paths(&self, diag: &mut ConfigDiagnostics) {
        for (field, path) in self.fields() {
            let Some(path) = path else { continue };
            if path.is_absolute() {
                diag.error_with_hint(
                    field,
                    format!("`{}` must be relative to the config file", path.display()),
                    "paths are resolved against the directory containing blog.toml",
                );
            } else if path.as_os_str().is_empty() {
                diag.error(field, "must not be empty");
            }
        }
    }

    /// Resolve every path against `root`.
    pub fn normalize(&mut self, root: &Path) {
        let resolve = |p: &Path| normalize_path(&root.join(p));
        self.blog = resolve(&self.blog);
        self.images = resolve(&self.images);
        self.drafts = resolve(&self.drafts);
        self.index = resolve(&self.index);
        self.static_root = resolve(&self.static_root);
        self.template = self.template.as_deref().map(resolve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_paths_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.blog, PathBuf::from("blog"));
        assert_eq!(config.paths.index, PathBuf::from("blog.html"));
        assert!(config.paths.template.is_none());
    }

    #[test]
    fn test_paths_normalize() {
        let mut paths = PathsConfig {
            template: Some("tpl/post.html".into()),
            ..PathsConfig::default()
        };
        let root = tempfile::tempdir().unwrap();
        paths.normalize(root.path());
        assert!(paths.blog.is_absolute());
        assert!(paths.blog.ends_with("blog"));
        assert!(paths.template.unwrap().ends_with("tpl/post.html"));
    }

    #[test]
    fn test_paths_must_be_relative() {
        let config = test_parse_config("[paths]\nblog = \"/var/www/blog\"\ndrafts = \"\"");
        let mut diag = ConfigDiagnostics::new();
        config.paths.validate_paths(&mut diag);
        assert_eq!(diag.len(), 2);
        assert!(diag.to_string().contains("paths.blog"));
    }
}
