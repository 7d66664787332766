//! `[cover]` section configuration.
//!
//! ```toml
//! [cover]
//! width = 800
//! height = 400
//! template = "auto"   # or default / tech / share / tutorial
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::post::cover::{CoverSize, CoverTemplate};

/// Generated cover image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub width: u32,
    pub height: u32,
    /// Template id, or `auto` to pick one from the title.
    pub template: String,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            template: "auto".to_string(),
        }
    }
}

impl CoverConfig {
    pub const TEMPLATE: FieldPath = FieldPath::new("cover.template");
    pub const SIZE: FieldPath = FieldPath::new("cover.width");

    pub fn size(&self) -> CoverSize {
        CoverSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Configured template, `None` for title-based selection.
    pub fn fixed_template(&self) -> Option<&str> {
        (self.template != "auto").then_some(self.template.as_str())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Some(id) = self.fixed_template()
            && CoverTemplate::find(id).is_none()
        {
            let known: Vec<_> = CoverTemplate::ALL.iter().map(|t| t.id).collect();
            diag.error_with_hint(
                Self::TEMPLATE,
                format!("unknown cover template `{id}`"),
                format!("use `auto` or one of: {}", known.join(", ")),
            );
        }
        if self.width == 0 || self.height == 0 {
            diag.error(Self::SIZE, "cover width and height must be greater than 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_cover_defaults() {
        let config = test_parse_config("");
        assert_eq!((config.cover.width, config.cover.height), (800, 400));
        assert!(config.cover.fixed_template().is_none());
    }

    #[test]
    fn test_cover_template_validation() {
        let config = test_parse_config("[cover]\ntemplate = \"tech\"");
        let mut diag = ConfigDiagnostics::new();
        config.cover.validate(&mut diag);
        assert!(diag.is_empty());
        assert_eq!(config.cover.fixed_template(), Some("tech"));

        let config = test_parse_config("[cover]\ntemplate = \"neon\"");
        let mut diag = ConfigDiagnostics::new();
        config.cover.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
