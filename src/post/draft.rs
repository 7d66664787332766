//! Editor drafts, stored as `<id>.json` in the drafts directory.

use serde::{Deserialize, Serialize};

use super::PostError;
use crate::config::PostConfig;
use crate::utils::{date::DateTimeUtc, hash::unique_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub last_modified: DateTimeUtc,
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
}

const fn default_auto_save() -> bool {
    true
}

impl Draft {
    /// New draft; `id` is generated when not given.
    pub fn new(id: Option<String>, title: Option<String>, content: Option<String>, auto_save: bool) -> Self {
        Self {
            id: id.unwrap_or_else(|| format!("draft-{}", unique_id("draft"))),
            title: title.unwrap_or_default(),
            content: content.unwrap_or_default(),
            last_modified: DateTimeUtc::now(),
            auto_save,
        }
    }

    /// Replace title and content; missing or empty values keep the old ones.
    pub fn update(&mut self, title: Option<&str>, content: Option<&str>) {
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            self.title = title.to_string();
        }
        if let Some(content) = content.filter(|c| !c.is_empty()) {
            self.content = content.to_string();
        }
        self.last_modified = DateTimeUtc::now();
    }

    pub fn validate(&self, limits: &PostConfig) -> Result<(), PostError> {
        let mut errors = Vec::new();
        if self.title.chars().count() > limits.max_title_length {
            errors.push(format!("标题长度不能超过{}个字符", limits.max_title_length));
        }
        PostError::check(errors)
    }

    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }
}
