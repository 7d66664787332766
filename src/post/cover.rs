//! SVG cover images.
//!
//! A cover is a two-stop diagonal gradient with the title centered on it.
//! Templates are picked explicitly or from keywords in the title.

use serde::Serialize;
use std::fmt::Write;

use crate::config::BlogConfig;
use crate::content::anchor::slugify;
use crate::store::{Store, StoreError};
use crate::utils::{date::DateTimeUtc, hash::now_millis, html::escape_attr};

/// Built-in cover style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub from: &'static str,
    #[serde(skip)]
    pub to: &'static str,
    #[serde(rename = "textColor")]
    pub text_color: &'static str,
}

impl CoverTemplate {
    pub const DEFAULT: Self = Self {
        id: "default",
        name: "默认模板",
        description: "蓝紫渐变背景，适合通用文章",
        from: "#667eea",
        to: "#764ba2",
        text_color: "#ffffff",
    };

    pub const ALL: [Self; 4] = [
        Self::DEFAULT,
        Self {
            id: "tech",
            name: "技术模板",
            description: "深蓝色背景，适合技术文章",
            from: "#1e3c72",
            to: "#2a5298",
            text_color: "#ffffff",
        },
        Self {
            id: "share",
            name: "分享模板",
            description: "粉色渐变背景，适合经验分享",
            from: "#ff9a9e",
            to: "#fecfef",
            text_color: "#333333",
        },
        Self {
            id: "tutorial",
            name: "教程模板",
            description: "清新渐变背景，适合教程文章",
            from: "#a8edea",
            to: "#fed6e3",
            text_color: "#333333",
        },
    ];

    pub fn find(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id == id)
    }

    /// CSS gradient, as shown in template pickers.
    pub fn background(&self) -> String {
        format!("linear-gradient(135deg, {} 0%, {} 100%)", self.from, self.to)
    }
}

/// Title keywords that select a template, checked in order.
const KEYWORDS: [(&[&str], &str); 3] = [
    (&["技术", "代码", "开发"], "tech"),
    (&["分享", "经验", "心得"], "share"),
    (&["教程", "指南", "如何"], "tutorial"),
];

/// Pick a template from the title; `default` when nothing matches.
pub fn auto_select(title: &str) -> CoverTemplate {
    let lower = title.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .and_then(|(_, id)| CoverTemplate::find(id))
        .unwrap_or(CoverTemplate::DEFAULT)
}

/// A generated cover, ready to be written to the images directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cover {
    #[serde(rename = "svgFilename")]
    pub filename: String,
    #[serde(skip)]
    pub svg: String,
    pub template: &'static str,
    pub title: String,
    pub timestamp: DateTimeUtc,
}

/// Cover canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CoverSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
        }
    }
}

/// Render a cover for `title`.
///
/// Unknown template ids fall back to title-based selection.
pub fn generate(title: &str, template: Option<&str>, size: CoverSize) -> Cover {
    let template = template
        .and_then(CoverTemplate::find)
        .unwrap_or_else(|| auto_select(title));

    let slug = slugify(title);
    let stem = if slug.is_empty() { "cover" } else { slug.as_str() };

    Cover {
        filename: format!("{stem}-{}.svg", now_millis()),
        svg: render_svg(title, &template, size),
        template: template.id,
        title: title.to_string(),
        timestamp: DateTimeUtc::now(),
    }
}

/// Generate a cover with the site's size and default template, and write it
/// to the images directory.
///
/// The returned cover carries the file name actually written.
pub fn save(store: &Store, config: &BlogConfig, title: &str, template: Option<&str>) -> Result<Cover, StoreError> {
    let template = template.or_else(|| config.cover.fixed_template());
    let mut cover = generate(title, template, config.cover.size());
    cover.filename = store.save_image(&cover.filename, cover.svg.as_bytes())?;
    Ok(cover)
}

fn render_svg(title: &str, template: &CoverTemplate, size: CoverSize) -> String {
    let CoverSize { width, height } = size;
    let font_size = (height / 8).max(12);

    let mut svg = String::with_capacity(768);
    let _ = writeln!(
        svg,
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#
    );
    svg.push_str("  <defs>\n");
    svg.push_str(r#"    <linearGradient id="grad1" x1="0%" y1="0%" x2="100%" y2="100%">"#);
    svg.push('\n');
    let _ = writeln!(
        svg,
        r#"      <stop offset="0%" style="stop-color:{};stop-opacity:1" />"#,
        template.from
    );
    let _ = writeln!(
        svg,
        r#"      <stop offset="100%" style="stop-color:{};stop-opacity:1" />"#,
        template.to
    );
    svg.push_str("    </linearGradient>\n  </defs>\n");
    let _ = writeln!(svg, r#"  <rect width="{width}" height="{height}" fill="url(#grad1)" />"#);
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="{}" font-family="Microsoft YaHei, PingFang SC, Arial, sans-serif" font-size="{font_size}" font-weight="bold" fill="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
        width / 2,
        height / 2,
        template.text_color,
        escape_attr(title)
    );
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_select() {
        assert_eq!(auto_select("Rust 开发笔记").id, "tech");
        assert_eq!(auto_select("读书心得").id, "share");
        assert_eq!(auto_select("如何写博客").id, "tutorial");
        assert_eq!(auto_select("Hello").id, "default");
        // first matching group wins
        assert_eq!(auto_select("技术分享").id, "tech");
    }

    #[test]
    fn test_find_template() {
        assert_eq!(CoverTemplate::find("share").map(|t| t.from), Some("#ff9a9e"));
        assert!(CoverTemplate::find("neon").is_none());
        assert_eq!(
            CoverTemplate::DEFAULT.background(),
            "linear-gradient(135deg, #667eea 0%, #764ba2 100%)"
        );
    }

    #[test]
    fn test_generate_escapes_title() {
        let cover = generate("<A & B>", Some("tutorial"), CoverSize::default());
        assert_eq!(cover.template, "tutorial");
        assert!(cover.svg.contains("&lt;A &amp; B&gt;"));
        assert!(cover.svg.contains("#a8edea"));
        assert!(cover.svg.contains(r#"width="800" height="400""#));
        assert!(cover.filename.starts_with("a-b-"));
        assert!(cover.filename.ends_with(".svg"));
    }

    #[test]
    fn test_generate_falls_back() {
        let cover = generate("!!", Some("unknown"), CoverSize { width: 400, height: 200 });
        assert_eq!(cover.template, "default");
        assert!(cover.filename.starts_with("cover-"));
        assert!(cover.svg.contains(r#"x="200" y="100""#));
    }

    #[test]
    fn test_save_uses_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::config::test_config_at(dir.path());
        config.cover.template = "share".into();
        config.cover.width = 600;
        let store = Store::new(&config);

        let cover = save(&store, &config, "Hello", None).unwrap();
        assert_eq!(cover.template, "share");
        let svg = std::fs::read_to_string(dir.path().join("blog-img").join(&cover.filename)).unwrap();
        assert!(svg.contains(r#"width="600""#));

        let cover = save(&store, &config, "Hello", Some("tech")).unwrap();
        assert_eq!(cover.template, "tech");
    }

    #[test]
    fn test_template_json() {
        let json = serde_json::to_value(CoverTemplate::ALL[1]).unwrap();
        assert_eq!(json["id"], "tech");
        assert_eq!(json["textColor"], "#ffffff");
        assert!(json.get("from").is_none());
    }
}
