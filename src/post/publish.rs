//! The publishing pipeline.
//!
//! ```text
//! request ─► BlogPost ─► validate ─► cover ─► render ─► page ─► store ─► index
//! ```
//!
//! Only validation and storage failures abort a publish. A cover that cannot
//! be written falls back to the default cover, and a blog index that cannot
//! be updated is logged and skipped.

use serde::Deserialize;
use thiserror::Error;

use super::cover;
use super::index::{self, IndexEntry, IndexError};
use super::{BlogPost, PostError, html_filename};
use crate::config::BlogConfig;
use crate::content::{Toc, reduce_html_with, render_markdown_with, synthesize_toc_with};
use crate::embed::post::{PostTemplate, PostVars};
use crate::store::{Store, StoreError};
use crate::utils::date::DateTimeUtc;
use crate::utils::html::{TagScanner, Token, attr, find_first_by_class};
use crate::{debug, log};

/// Cover sources that belong to page chrome rather than the post.
const NOT_A_COVER: [&str; 2] = ["PicGo", "Logo"];

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("invalid post: {0}")]
    Invalid(#[from] PostError),

    #[error("post `{0}` not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Post content sent by the editor or the CLI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Cover template id; the configured default applies when absent.
    #[serde(default, alias = "template")]
    pub cover_template: Option<String>,
}

/// A published page read back for display or editing.
#[derive(Debug, Clone)]
pub struct LoadedPost {
    pub filename: String,
    pub title: String,
    /// The page as stored.
    pub html: String,
    pub markdown: String,
    /// Last modification time.
    pub publish_date: DateTimeUtc,
    pub size: u64,
}

pub struct Publisher<'a> {
    config: &'a BlogConfig,
    template: &'a PostTemplate,
    store: &'a Store,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a BlogConfig, template: &'a PostTemplate, store: &'a Store) -> Self {
        Self {
            config,
            template,
            store,
        }
    }

    /// Publish a new post under a fresh file name.
    pub fn publish(&self, request: PublishRequest) -> Result<BlogPost, PublishError> {
        let PublishRequest {
            title,
            content,
            tags,
            cover_template,
        } = request;
        let mut post = BlogPost::new(&title, &content, tags, DateTimeUtc::now(), &self.config.post);
        post.validate(&self.config.post)?;

        post.cover_image = self.new_cover(&post.title, cover_template.as_deref());
        let page = self.render_page(&mut post);
        post.filename = self.store.save_post(&post.filename, &page)?;
        log!("publish"; "{}", post.filename);

        let entry = self.index_entry(&post);
        self.update_index(|html| index::add_entry(html, &entry));
        Ok(post)
    }

    /// Re-render an existing post, keeping its cover and publish date.
    pub fn update(&self, filename: &str, request: PublishRequest) -> Result<BlogPost, PublishError> {
        let filename = html_filename(filename);
        if !self.store.post_exists(&filename) {
            return Err(PublishError::NotFound(filename));
        }

        let PublishRequest {
            title,
            content,
            tags,
            cover_template,
        } = request;
        let dates = self.store.post_dates(&filename)?;
        let mut post = BlogPost::new(&title, &content, tags, dates.created, &self.config.post);
        post.filename = filename;
        post.validate(&self.config.post)?;

        let existing = self.store.read_post(&post.filename)?;
        post.cover_image = match self.existing_cover(&existing) {
            Some(src) => {
                debug!("publish"; "keeping cover {}", src);
                src
            }
            None => self.new_cover(&post.title, cover_template.as_deref()),
        };

        let page = self.render_page(&mut post);
        self.store.write_post(&post.filename, &page)?;
        log!("publish"; "updated {}", post.filename);

        let entry = self.index_entry(&post);
        self.update_index(|html| index::replace_entry(html, &entry.filename, &entry));
        Ok(post)
    }

    /// Read a published page back, with its Markdown reconstructed.
    pub fn load(&self, filename: &str) -> Result<LoadedPost, PublishError> {
        let filename = html_filename(filename);
        let html = self.store.read_post(&filename).map_err(|err| match err {
            StoreError::NotFound(_) => PublishError::NotFound(filename.clone()),
            err => err.into(),
        })?;
        let dates = self.store.post_dates(&filename)?;

        let stem = filename.trim_end_matches(".html");
        let options = self.config.reduce.options(&self.config.site, Some(stem));
        let reduced = reduce_html_with(&html, &options);

        Ok(LoadedPost {
            title: reduced.title.unwrap_or_else(|| stem.to_string()),
            markdown: reduced.markdown,
            publish_date: dates.modified,
            size: html.len() as u64,
            filename,
            html,
        })
    }

    /// Generate and store a cover, or fall back to the default one.
    pub fn new_cover(&self, title: &str, template: Option<&str>) -> String {
        match cover::save(self.store, self.config, title, template) {
            Ok(cover) => self.config.site.cover_url(&cover.filename),
            Err(err) => {
                log!("publish"; "cover generation failed, using default cover: {}", err);
                self.config.site.default_cover.clone()
            }
        }
    }

    /// Cover image of a stored page: the first image of the article header,
    /// ignoring site chrome.
    fn existing_cover(&self, html: &str) -> Option<String> {
        let reduce = &self.config.reduce;
        let main = find_first_by_class(html, &reduce.main_class)?;
        let mut header = &html[main.inner];
        if let Some(content) = find_first_by_class(header, &reduce.content_class) {
            header = &header[..content.outer.start];
        }

        let src = TagScanner::new(header).find_map(|item| match item.token {
            Token::Open { name, attrs, .. } if name.eq_ignore_ascii_case("img") => attr(attrs, "src"),
            _ => None,
        })?;
        let chrome = NOT_A_COVER.iter().any(|marker| src.contains(marker));
        (!src.is_empty() && !chrome).then_some(src)
    }

    /// Render the post body and TOC into the page template.
    fn render_page(&self, post: &mut BlogPost) -> String {
        let rendered = render_markdown_with(&post.content, &self.config.markdown);
        let toc: Toc = synthesize_toc_with(&rendered.headings, &self.config.toc.options());
        post.table_of_contents = rendered.headings;

        let site = &self.config.site;
        let vars = PostVars {
            title: post.title.clone(),
            title_suffix: site.title_suffix.clone(),
            author: site.author.clone(),
            publish_date: post.publish_date.with_offset_hours(site.utc_offset).to_chinese_date(),
            cover_image: post.cover_image.clone(),
            content: rendered.html,
            table_of_contents: toc.markup,
        };
        self.template.render(&vars)
    }

    fn index_entry(&self, post: &BlogPost) -> IndexEntry {
        IndexEntry {
            filename: post.filename.clone(),
            title: post.title.clone(),
            date: post.publish_date.with_offset_hours(self.config.site.utc_offset),
            cover_image: post.cover_image.clone(),
        }
    }

    fn update_index(&self, edit: impl FnOnce(&str) -> Result<String, IndexError>) {
        let result = self.store.update_index::<anyhow::Error>(|html| {
            let issues = index::validate(html);
            if !issues.is_empty() {
                log!("publish"; "blog index: {}", issues.join("; "));
            }
            Ok(edit(html)?)
        });
        if let Err(err) = result {
            log!("publish"; "failed to update blog index: {:#}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::embed::post::POST_HTML;
    use std::fs;

    const INDEX: &str = r#"<html><body>
<nav class="navbar"></nav>
<div class="blog-posts-grid">
</div>
<footer></footer>
</body></html>"#;

    struct Site {
        dir: tempfile::TempDir,
        config: BlogConfig,
        template: PostTemplate,
        store: Store,
    }

    impl Site {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("blog.html"), INDEX).unwrap();
            let config = test_config_at(dir.path());
            let store = Store::new(&config);
            Self { dir, config, template: POST_HTML, store }
        }

        fn publisher(&self) -> Publisher<'_> {
            Publisher::new(&self.config, &self.template, &self.store)
        }

        fn read(&self, rel: &str) -> String {
            fs::read_to_string(self.dir.path().join(rel)).unwrap()
        }
    }

    fn request(title: &str, content: &str) -> PublishRequest {
        PublishRequest {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_publish() {
        let site = Site::new();
        let post = site
            .publisher()
            .publish(request("Rust 开发", "## Setup\n\ntext\n\n### Install\n\nmore"))
            .unwrap();

        assert_eq!(post.filename, "rust-开发.html");
        assert!(post.cover_image.starts_with("../blog-img/rust-开发-"));
        assert_eq!(post.table_of_contents.len(), 2);

        let page = site.read("blog/rust-开发.html");
        assert!(page.contains("<h2>Rust 开发</h2>"));
        assert!(page.contains(r#"id="setup""#));
        assert!(page.contains(&post.cover_image));
        assert!(page.contains("<title>Rust 开发 | Kobe Zhang</title>"));

        let svg = post.cover_image.trim_start_matches("../blog-img/");
        assert!(site.read(&format!("blog-img/{svg}")).contains("#1e3c72"));

        let listed = index::entries(&site.read("blog.html"));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "rust-开发.html");
        assert_eq!(listed[0].cover_image, format!("blog-img/{svg}"));
    }

    #[test]
    fn test_publish_unique_filenames() {
        let site = Site::new();
        let publisher = site.publisher();
        let first = publisher.publish(request("Hello", "a")).unwrap();
        let second = publisher.publish(request("Hello", "b")).unwrap();
        assert_eq!(first.filename, "hello.html");
        assert_eq!(second.filename, "hello-1.html");
        assert_eq!(index::entries(&site.read("blog.html")).len(), 2);
    }

    #[test]
    fn test_publish_validation() {
        let site = Site::new();
        let err = site.publisher().publish(request("", "")).unwrap_err();
        let PublishError::Invalid(err) = err else {
            panic!("expected validation error");
        };
        assert_eq!(err.errors, ["标题不能为空", "内容不能为空"]);
        assert!(!site.dir.path().join("blog").exists());
    }

    #[test]
    fn test_publish_without_index() {
        let site = Site::new();
        fs::remove_file(site.dir.path().join("blog.html")).unwrap();
        let post = site.publisher().publish(request("T", "body")).unwrap();
        assert!(site.store.post_exists(&post.filename));
    }

    #[test]
    fn test_publish_into_incomplete_index() {
        let site = Site::new();
        let page = r#"<div class="blog-posts-grid"></div>"#;
        fs::write(site.dir.path().join("blog.html"), page).unwrap();
        assert_eq!(index::validate(page).len(), 2);

        site.publisher().publish(request("Hello", "body")).unwrap();
        let listed = index::entries(&site.read("blog.html"));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Hello");
    }

    #[test]
    fn test_update_keeps_cover() {
        let site = Site::new();
        let publisher = site.publisher();
        let original = publisher.publish(request("Post", "old body")).unwrap();

        let updated = publisher
            .update("post", request("Post v2", "## New\n\nnew body"))
            .unwrap();
        assert_eq!(updated.filename, "post.html");
        assert_eq!(updated.cover_image, original.cover_image);

        let page = site.read("blog/post.html");
        assert!(page.contains("new body"));
        assert!(!page.contains("old body"));

        let listed = index::entries(&site.read("blog.html"));
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Post v2");
    }

    #[test]
    fn test_update_replaces_chrome_cover() {
        let site = Site::new();
        let page = r#"<div class="blog-main-content"><h2>Old</h2><img src="../img/Logo.png" alt="x"><div class="markdown-content"><img src="inline.png" alt="y"></div></div>"#;
        site.store.save_post("old.html", page).unwrap();

        let post = site.publisher().update("old.html", request("Old", "body")).unwrap();
        assert!(post.cover_image.starts_with("../blog-img/old-"));
    }

    #[test]
    fn test_update_missing() {
        let site = Site::new();
        let err = site.publisher().update("nope", request("T", "c")).unwrap_err();
        assert!(matches!(err, PublishError::NotFound(name) if name == "nope.html"));
    }

    #[test]
    fn test_load() {
        let site = Site::new();
        let publisher = site.publisher();
        publisher
            .publish(request("Load me", "Intro **bold**\n\n- a\n- b"))
            .unwrap();

        let loaded = publisher.load("load-me").unwrap();
        assert_eq!(loaded.filename, "load-me.html");
        assert_eq!(loaded.title, "Load me");
        assert!(loaded.markdown.contains("**bold**"));
        assert!(loaded.markdown.contains("- a\n- b"));
        assert!(!loaded.markdown.contains("Logo"));
        assert_eq!(loaded.size, loaded.html.len() as u64);

        assert!(matches!(publisher.load("missing"), Err(PublishError::NotFound(_))));
    }

    #[test]
    fn test_request_json() {
        let json = r#"{"title":"T","content":"c","tags":["x"],"template":"tech"}"#;
        let request: PublishRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.cover_template.as_deref(), Some("tech"));
        let request: PublishRequest = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert!(request.content.is_empty());
    }
}
