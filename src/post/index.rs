//! Blog index page upkeep.
//!
//! The index (`blog.html`) lists posts as `.blog-post-item` cards inside a
//! `.blog-posts-grid` container. Every edit rewrites the grid so cards stay
//! sorted newest first by the Chinese date in their `.post-meta` line.
//! Anything outside the grid is left byte-for-byte intact.

use serde::Serialize;
use thiserror::Error;

use crate::utils::date::DateTimeUtc;
use crate::utils::html::{
    ElementSpan, TagScanner, Token, attr, escape, escape_attr, find_by_class, find_first_by_class,
    find_first_by_tag, strip_tags, unescape,
};

const GRID_CLASS: &str = "blog-posts-grid";
const ITEM_CLASS: &str = "blog-post-item";
const ITEM_INDENT: &str = "                ";
const GRID_CLOSE_INDENT: &str = "            ";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("blog index has no `.blog-posts-grid` container")]
    MissingGrid,
}

/// Tags shown on a card, picked from title keywords in order.
const TAGS: [(&[&str], &str); 4] = [
    (&["技术", "代码", "开发"], "技术分享"),
    (&["经验", "心得", "分享"], "经验分享"),
    (&["教程", "指南", "如何"], "教程操作"),
    (&["不吐不快", "吐槽", "对比"], "不吐不快"),
];

pub fn tag_for_title(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    TAGS.iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map_or(TAGS[0].1, |(_, tag)| *tag)
}

/// A card to insert into the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub filename: String,
    pub title: String,
    /// Display date, already shifted to the site's offset.
    pub date: DateTimeUtc,
    /// Cover URL relative to the post page (`../blog-img/x.svg`).
    pub cover_image: String,
}

impl IndexEntry {
    /// Card markup; the cover path is made relative to the index page.
    pub fn to_html(&self) -> String {
        let cover = self.cover_image.strip_prefix("../").unwrap_or(&self.cover_image);
        let href = escape_attr(&self.filename);
        let title = escape(&self.title);

        format!(
            r#"<div class="{ITEM_CLASS}">
{ITEM_INDENT}    <a href="blog/{href}">
{ITEM_INDENT}        <img src="{cover}" alt="{alt}">
{ITEM_INDENT}    </a>
{ITEM_INDENT}    <h3>{title}</h3>
{ITEM_INDENT}    <p class="post-meta">{date}</p>
{ITEM_INDENT}    <div class="post-tags">
{ITEM_INDENT}        <span class="tag">{tag}</span>
{ITEM_INDENT}        <a href="blog/{href}" class="details-button">查看详情</a>
{ITEM_INDENT}    </div>
{ITEM_INDENT}</div>"#,
            cover = escape_attr(cover),
            alt = escape_attr(&self.title),
            date = self.date.to_chinese_date(),
            tag = tag_for_title(&self.title),
        )
    }
}

/// A card read back from the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedEntry {
    pub filename: String,
    pub title: String,
    pub date: String,
    pub cover_image: String,
    pub url: String,
}

/// Insert `entry` and re-sort the grid newest first.
///
/// Cards whose date cannot be read sort as if dated now. Ties keep their
/// current order, with the new card last among equals.
pub fn add_entry(html: &str, entry: &IndexEntry) -> Result<String, IndexError> {
    let grid = find_first_by_class(html, GRID_CLASS).ok_or(IndexError::MissingGrid)?;
    let inner = &html[grid.inner.clone()];
    let now = DateTimeUtc::now();

    let mut cards: Vec<(DateTimeUtc, String)> = find_by_class(inner, ITEM_CLASS)
        .into_iter()
        .map(|span| {
            let card = &inner[span.outer.clone()];
            let date = card_meta(card)
                .and_then(|meta| DateTimeUtc::parse_chinese_date(&meta))
                .unwrap_or(now);
            (date, card.to_string())
        })
        .collect();
    cards.push((entry.date, entry.to_html()));
    cards.sort_by(|a, b| b.0.cmp(&a.0));

    Ok(rewrite_grid(html, &grid, cards.iter().map(|(_, card)| card.as_str())))
}

/// Drop every card linking to `blog/<filename>`. Returns the page and
/// whether anything was removed.
pub fn remove_entry(html: &str, filename: &str) -> (String, bool) {
    let target = format!("blog/{filename}");
    let doomed: Vec<_> = find_by_class(html, ITEM_CLASS)
        .into_iter()
        .filter(|span| card_links(&html[span.outer.clone()]).any(|href| href == target))
        .collect();

    if doomed.is_empty() {
        return (html.to_string(), false);
    }

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for span in &doomed {
        // take the card's leading indentation and line break with it
        let start = html[..span.outer.start].trim_end_matches([' ', '\t']).len();
        let start = html[..start].strip_suffix('\n').map_or(start, str::len);
        let start = start.max(last);
        out.push_str(&html[last..start]);
        last = span.outer.end;
    }
    out.push_str(&html[last..]);
    (out, true)
}

/// Remove the card for `old_filename`, then add `entry`.
pub fn replace_entry(html: &str, old_filename: &str, entry: &IndexEntry) -> Result<String, IndexError> {
    let (html, _) = remove_entry(html, old_filename);
    add_entry(&html, entry)
}

/// Cards that link to a post and carry a title.
pub fn entries(html: &str) -> Vec<ListedEntry> {
    find_by_class(html, ITEM_CLASS)
        .into_iter()
        .filter_map(|span| {
            let card = &html[span.outer];
            let url = card_links(card).find(|href| href.starts_with("blog/"))?;
            let title = find_first_by_tag(card, "h3").map(|h3| element_text(card, &h3))?;
            let cover_image = first_attr(card, "img", "src").unwrap_or_default();

            Some(ListedEntry {
                filename: url.trim_start_matches("blog/").to_string(),
                title,
                date: card_meta(card).unwrap_or_default(),
                cover_image,
                url,
            })
        })
        .collect()
}

/// Structural problems that would stop the index from being updated.
pub fn validate(html: &str) -> Vec<String> {
    let mut issues = Vec::new();
    if find_first_by_class(html, GRID_CLASS).is_none() {
        issues.push(format!("缺少博文网格容器 .{GRID_CLASS}"));
    }
    if find_first_by_class(html, "navbar").is_none() {
        issues.push("缺少导航栏 .navbar".to_string());
    }
    if find_first_by_tag(html, "footer").is_none() {
        issues.push("缺少页脚 footer".to_string());
    }
    issues
}

fn rewrite_grid<'a>(html: &str, grid: &ElementSpan, cards: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::with_capacity(html.len() + 1024);
    out.push_str(&html[..grid.inner.start]);
    for card in cards {
        out.push('\n');
        out.push_str(ITEM_INDENT);
        out.push_str(card);
    }
    out.push('\n');
    out.push_str(GRID_CLOSE_INDENT);
    out.push_str(&html[grid.inner.end..]);
    out
}

fn card_meta(card: &str) -> Option<String> {
    find_first_by_class(card, "post-meta").map(|meta| element_text(card, &meta))
}

fn element_text(html: &str, span: &ElementSpan) -> String {
    unescape(strip_tags(&html[span.inner.clone()]).trim()).into_owned()
}

fn card_links(card: &str) -> impl Iterator<Item = String> + '_ {
    TagScanner::new(card).filter_map(|item| match item.token {
        Token::Open { name, attrs, .. } if name.eq_ignore_ascii_case("a") => attr(attrs, "href"),
        _ => None,
    })
}

fn first_attr(html: &str, tag: &str, name: &str) -> Option<String> {
    TagScanner::new(html).find_map(|item| match item.token {
        Token::Open { name: n, attrs, .. } if n.eq_ignore_ascii_case(tag) => attr(attrs, name),
        _ => None,
    })
}
