//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! service = "blog-writing-service"
//! author = "Kobe Zhang"
//! title_suffix = " | Kobe Zhang"     # appended to <title>, stripped when reading back
//! utc_offset = 8                      # hours, for displayed dates
//! cover_prefix = "../blog-img/"       # cover URL as seen from a post page
//! default_cover = "../blog-img/default-cover.png"
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Site identity and display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Service name reported by the health check.
    pub service: String,
    pub author: String,
    pub title_suffix: String,
    pub utc_offset: i8,
    pub cover_prefix: String,
    pub default_cover: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            service: "blog-writing-service".to_string(),
            author: "Kobe Zhang".to_string(),
            title_suffix: " | Kobe Zhang".to_string(),
            utc_offset: 8,
            cover_prefix: "../blog-img/".to_string(),
            default_cover: "../blog-img/default-cover.png".to_string(),
        }
    }
}

impl SiteConfig {
    pub const UTC_OFFSET: FieldPath = FieldPath::new("site.utc_offset");
    pub const COVER_PREFIX: FieldPath = FieldPath::new("site.cover_prefix");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(-12..=14).contains(&self.utc_offset) {
            diag.error(Self::UTC_OFFSET, format!("{} is not a valid UTC offset", self.utc_offset));
        }
        if !self.cover_prefix.is_empty() && !self.cover_prefix.ends_with('/') {
            diag.error_with_hint(
                Self::COVER_PREFIX,
                "must end with `/`",
                format!("use \"{}/\"", self.cover_prefix),
            );
        }
    }

    /// URL of a cover image file as referenced from a post page.
    pub fn cover_url(&self, filename: &str) -> String {
        format!("{}{filename}", self.cover_prefix)
    }
}
