//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `post` - Post page template (`post/post-template.html`)
//!
//! # Usage
//!
//! ```ignore
//! use embed::post::{PostTemplate, PostVars};
//!
//! let template = PostTemplate::load(config.paths.template.as_deref())?;
//! let html = template.render(&vars);
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod post {
    use std::path::Path;

    use anyhow::{Context, Result};

    use super::{Template, TemplateVars};
    use crate::utils::html::{escape, escape_attr};

    /// Values substituted into a post page.
    ///
    /// `content` and `table_of_contents` are HTML; everything else is text
    /// and gets escaped.
    #[derive(Debug, Clone, Default)]
    pub struct PostVars {
        pub title: String,
        pub title_suffix: String,
        pub author: String,
        pub publish_date: String,
        /// Cover image URL, empty for none.
        pub cover_image: String,
        pub content: String,
        pub table_of_contents: String,
    }

    impl PostVars {
        /// `<img>` for the cover, or nothing.
        pub fn cover_html(&self) -> String {
            if self.cover_image.is_empty() {
                return String::new();
            }
            format!(
                r#"<img src="{}" alt="{}">"#,
                escape_attr(&self.cover_image),
                escape_attr(&self.title)
            )
        }

        fn lookup(&self, name: &str) -> Option<String> {
            Some(match name {
                "TITLE" => escape(&self.title).into_owned(),
                "TITLE_SUFFIX" => escape(&self.title_suffix).into_owned(),
                "AUTHOR" => escape(&self.author).into_owned(),
                "PUBLISH_DATE" => escape(&self.publish_date).into_owned(),
                "COVER_IMAGE" => self.cover_html(),
                "CONTENT" => self.content.clone(),
                "TABLE_OF_CONTENTS" => self.table_of_contents.clone(),
                _ => return None,
            })
        }
    }

    impl TemplateVars for PostVars {
        /// Single pass over the template, so placeholder text inside the
        /// substituted values is left alone.
        fn apply(&self, content: &str) -> String {
            let mut out = String::with_capacity(content.len() + self.content.len() + self.table_of_contents.len());
            let mut rest = content;

            while let Some(open) = rest.find("{{") {
                out.push_str(&rest[..open]);
                let after = &rest[open + 2..];
                match after.find("}}").and_then(|close| Some((close, self.lookup(&after[..close])?))) {
                    Some((close, value)) => {
                        out.push_str(&value);
                        rest = &after[close + 2..];
                    }
                    None => {
                        out.push_str("{{");
                        rest = after;
                    }
                }
            }

            out.push_str(rest);
            out
        }
    }

    pub type PostTemplate = Template<PostVars>;

    /// Built-in post page.
    pub const POST_HTML: PostTemplate = Template::new(include_str!("post/post-template.html"));

    impl PostTemplate {
        /// Read the site's template, or use the built-in one.
        pub fn load(path: Option<&Path>) -> Result<Self> {
            match path {
                Some(path) => {
                    let content = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read post template `{}`", path.display()))?;
                    Ok(Self::owned(content))
                }
                None => Ok(POST_HTML),
            }
        }
    }

}
