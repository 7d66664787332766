//! Blog posts, drafts and the publishing pipeline around them.
//!
//! | Module    | Purpose                                         |
//! |-----------|-------------------------------------------------|
//! | `cover`   | SVG cover generation                            |
//! | `draft`   | Editor drafts                                   |
//! | `index`   | Blog index page (`.blog-posts-grid`) upkeep     |
//! | `publish` | Validate, render, store and index a post        |

pub mod cover;
pub mod draft;
pub mod index;
pub mod publish;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PostConfig;
use crate::content::anchor::slugify;
use crate::content::HeadingRecord;
use crate::utils::{date::DateTimeUtc, hash::unique_id};

pub use draft::Draft;

/// Validation failures, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .errors.join("; "))]
pub struct PostError {
    pub errors: Vec<String>,
}

impl PostError {
    /// `Ok` when `errors` is empty.
    pub fn check(errors: Vec<String>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }
}

/// A post being published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    /// Markdown source.
    pub content: String,
    pub cover_image: String,
    pub publish_date: DateTimeUtc,
    pub filename: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub table_of_contents: Vec<HeadingRecord>,
}

impl BlogPost {
    pub fn new(title: &str, content: &str, tags: Vec<String>, now: DateTimeUtc, limits: &PostConfig) -> Self {
        let title = title.trim().to_string();
        let content = content.trim().to_string();
        let id = unique_id(&title);
        let filename = filename_for(&title, &id);
        let excerpt = excerpt(&content, limits.excerpt_length);

        Self {
            id,
            title,
            content,
            cover_image: String::new(),
            publish_date: now,
            filename,
            excerpt,
            tags,
            table_of_contents: Vec::new(),
        }
    }

    pub fn validate(&self, limits: &PostConfig) -> Result<(), PostError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push("标题不能为空".to_string());
        }
        if self.content.trim().is_empty() {
            errors.push("内容不能为空".to_string());
        }
        if self.title.chars().count() > limits.max_title_length {
            errors.push(format!("标题长度不能超过{}个字符", limits.max_title_length));
        }
        PostError::check(errors)
    }
}

/// `<slug>.html`, or `post-<id>.html` when the title has no usable characters.
pub fn filename_for(title: &str, id: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("post-{id}.html")
    } else {
        format!("{slug}.html")
    }
}

/// `name` with `.html` appended when missing.
pub fn html_filename(name: &str) -> String {
    if name.ends_with(".html") {
        name.to_string()
    } else {
        format!("{name}.html")
    }
}

/// Plain-text summary: tags and `#*`_~` removed, newlines folded, truncated
/// to `max_chars` characters plus `...`.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let mut plain = String::with_capacity(content.len());
    let mut in_tag = false;
    let mut last_newline = false;

    for c in content.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            '#' | '*' | '`' | '_' | '~' => {}
            '\n' | '\r' => {
                if !last_newline {
                    plain.push(' ');
                }
                last_newline = true;
                continue;
            }
            _ => plain.push(c),
        }
        last_newline = false;
    }

    let plain = plain.trim();
    if plain.chars().count() > max_chars {
        let cut: String = plain.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        plain.to_string()
    }
}
