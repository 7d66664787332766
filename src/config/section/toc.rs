//! `[toc]` section configuration.
//!
//! ```toml
//! [toc]
//! label = "目录"      # caption above the list
//! collapsed = true    # sub menus start hidden
//! ```

use serde::{Deserialize, Serialize};

use crate::content::TocOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    pub label: String,
    pub collapsed: bool,
}

impl Default for TocConfig {
    fn default() -> Self {
        let options = TocOptions::default();
        Self {
            label: options.label,
            collapsed: options.collapsed,
        }
    }
}

impl TocConfig {
    pub fn options(&self) -> TocOptions {
        TocOptions {
            label: self.label.clone(),
            collapsed: self.collapsed,
        }
    }
}
