//! `[reduce]` section configuration.
//!
//! Class names the HTML reducer looks for when loading a post back into the
//! editor.
//!
//! ```toml
//! [reduce]
//! content_class = "markdown-content"
//! main_class = "blog-main-content"
//! ```

use serde::{Deserialize, Serialize};

use super::SiteConfig;
use crate::content::ReduceOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceConfig {
    pub content_class: String,
    pub main_class: String,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        let options = ReduceOptions::default();
        Self {
            content_class: options.content_class,
            main_class: options.main_class,
        }
    }
}

impl ReduceConfig {
    /// Reducer options for one page; `fallback_title` is usually the file stem.
    pub fn options(&self, site: &SiteConfig, fallback_title: Option<&str>) -> ReduceOptions {
        ReduceOptions {
            content_class: self.content_class.clone(),
            main_class: self.main_class.clone(),
            title_suffix: Some(site.title_suffix.clone()).filter(|s| !s.trim().is_empty()),
            fallback_title: fallback_title.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_reduce_options() {
        let config = test_parse_config("[reduce]\ncontent_class = \"post-body\"");
        let options = config.reduce.options(&config.site, Some("stem"));
        assert_eq!(options.content_class, "post-body");
        assert_eq!(options.main_class, "blog-main-content");
        assert_eq!(options.title_suffix.as_deref(), Some(" | Kobe Zhang"));
        assert_eq!(options.fallback_title.as_deref(), Some("stem"));
    }
}
