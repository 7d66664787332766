//! Table-of-contents synthesis.
//!
//! A flat heading list becomes a three-tier outline:
//!
//! ```text
//! h1/h2  main entry        (collapsible when it has sub entries)
//!   h3   sub entry         (needs a preceding main entry)
//!     h4 child entry       (collected by forward scan from its h3)
//! ```
//!
//! h5/h6 are not shown. An h4 that directly follows a main entry (no h3 in
//! between) has no place in the outline and is dropped.

use serde::Serialize;
use std::fmt::Write;

use super::heading::HeadingRecord;
use crate::utils::html::{escape, escape_attr};

// ============================================================================
// Outline
// ============================================================================

/// Level 1/2 entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    #[serde(flatten)]
    pub heading: HeadingRecord,
    pub children: Vec<TocSubEntry>,
}

impl TocEntry {
    /// Entries with sub entries render as collapsible groups.
    pub fn is_collapsible(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Level 3 entry with its level 4 children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocSubEntry {
    #[serde(flatten)]
    pub heading: HeadingRecord,
    pub children: Vec<HeadingRecord>,
}

/// Outline plus rendered markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Toc {
    pub outline: Vec<TocEntry>,
    pub markup: String,
}

/// Rendering knobs for the TOC markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocOptions {
    /// Caption above the list.
    pub label: String,
    /// Hide sub menus until expanded by the page script.
    pub collapsed: bool,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            label: "目录".to_string(),
            collapsed: true,
        }
    }
}

/// Group headings into the three-tier outline.
pub fn build_outline(headings: &[HeadingRecord]) -> Vec<TocEntry> {
    let mut outline = Vec::new();
    let mut current: Option<TocEntry> = None;

    for (index, heading) in headings.iter().enumerate() {
        match heading.level {
            1 | 2 => {
                outline.extend(current.take());
                current = Some(TocEntry {
                    heading: heading.clone(),
                    children: Vec::new(),
                });
            }
            3 => {
                let Some(main) = current.as_mut() else {
                    continue;
                };
                let children = headings[index + 1..]
                    .iter()
                    .take_while(|next| next.level > 3)
                    .filter(|next| next.level == 4)
                    .cloned()
                    .collect();
                main.children.push(TocSubEntry {
                    heading: heading.clone(),
                    children,
                });
            }
            _ => {}
        }
    }

    outline.extend(current);
    outline
}

/// Build the outline and render it with default options.
pub fn synthesize_toc(headings: &[HeadingRecord]) -> Toc {
    synthesize_toc_with(headings, &TocOptions::default())
}

pub fn synthesize_toc_with(headings: &[HeadingRecord], options: &TocOptions) -> Toc {
    let outline = build_outline(headings);
    let markup = render_outline(&outline, options);
    Toc { outline, markup }
}

// ============================================================================
// Markup
// ============================================================================

const CONTAINER_STYLE: &str = "position: sticky; top: 2rem; align-self: start; background: var(--card-bg); padding: 1rem; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);";
const LIST_STYLE: &str = "list-style: none; padding: 0;";
const NESTED_LIST_STYLE: &str = "list-style: none; padding-left: 20px;";
const ITEM_STYLE: &str = "margin: 0.5rem 0;";

/// Render an outline. An empty outline renders as an empty string.
pub fn render_outline(outline: &[TocEntry], options: &TocOptions) -> String {
    if outline.is_empty() {
        return String::new();
    }

    let mut html = String::with_capacity(256 * outline.len());
    let _ = writeln!(html, r#"<div class="blog-toc" style="{CONTAINER_STYLE}">"#);
    let _ = writeln!(html, "  <h3>{}</h3>", escape(&options.label));
    let _ = writeln!(html, r#"  <ul style="{LIST_STYLE}">"#);

    for entry in outline {
        write_entry(&mut html, entry, options);
    }

    html.push_str("  </ul>\n</div>");
    html
}

fn link(heading: &HeadingRecord) -> String {
    format!(
        r##"<a href="#{}">{}</a>"##,
        escape_attr(&heading.anchor),
        escape(&heading.title)
    )
}

fn write_entry(html: &mut String, entry: &TocEntry, options: &TocOptions) {
    if !entry.is_collapsible() {
        let _ = writeln!(
            html,
            r#"    <li style="{ITEM_STYLE}" class="toc-main-item">{}</li>"#,
            link(&entry.heading)
        );
        return;
    }

    let hidden = if options.collapsed { " display: none;" } else { "" };
    let _ = writeln!(
        html,
        r#"    <li style="{ITEM_STYLE}" class="collapsible toc-main-item">"#
    );
    let _ = writeln!(html, "      {}", link(&entry.heading));
    let _ = writeln!(
        html,
        r#"      <ul class="submenu" style="{NESTED_LIST_STYLE}{hidden}">"#
    );

    for sub in &entry.children {
        if sub.children.is_empty() {
            let _ = writeln!(html, r#"        <li style="{ITEM_STYLE}">{}</li>"#, link(&sub.heading));
            continue;
        }
        let _ = writeln!(html, r#"        <li style="{ITEM_STYLE}">{}"#, link(&sub.heading));
        let _ = writeln!(html, r#"          <ul style="{NESTED_LIST_STYLE}">"#);
        for child in &sub.children {
            let _ = writeln!(html, r#"            <li style="{ITEM_STYLE}">{}</li>"#, link(child));
        }
        html.push_str("          </ul>\n        </li>\n");
    }

    html.push_str("      </ul>\n    </li>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::heading::{SourceMode, extract_headings};

    fn h(level: u8, title: &str) -> HeadingRecord {
        HeadingRecord {
            level,
            title: title.to_string(),
            anchor: title.to_lowercase(),
        }
    }

    #[test]
    fn test_empty_headings() {
        let toc = synthesize_toc(&[]);
        assert!(toc.outline.is_empty());
        assert!(toc.markup.is_empty());
    }

    #[test]
    fn test_single_heading() {
        let toc = synthesize_toc(&extract_headings("# Only", SourceMode::Markdown));
        assert_eq!(toc.outline.len(), 1);
        assert!(!toc.outline[0].is_collapsible());
        assert!(toc.markup.contains(r##"<a href="#only">Only</a>"##));
        assert!(toc.markup.contains(r#"class="toc-main-item""#));
        assert!(!toc.markup.contains("collapsible"));
    }

    #[test]
    fn test_three_tier_nesting() {
        let md = "## Intro\n\ncontent\n\n### Sub\n\nmore\n\n#### Detail\n\neven more";
        let toc = synthesize_toc(&extract_headings(md, SourceMode::Markdown));

        assert_eq!(toc.outline.len(), 1);
        let main = &toc.outline[0];
        assert!(main.is_collapsible());
        assert_eq!(main.heading.title, "Intro");
        assert_eq!(main.children.len(), 1);
        assert_eq!(main.children[0].heading.title, "Sub");
        assert_eq!(main.children[0].children.len(), 1);
        assert_eq!(main.children[0].children[0].title, "Detail");

        assert!(toc.markup.contains("collapsible toc-main-item"));
        assert!(toc.markup.contains("display: none;"));
        assert!(toc.markup.contains(r##"href="#detail""##));
    }

    #[test]
    fn test_orphans_and_deep_levels_dropped() {
        let headings = vec![
            h(3, "Orphan"),
            h(4, "OrphanChild"),
            h(2, "Main"),
            h(4, "Skipped"),
            h(3, "Sub"),
            h(5, "Deep"),
            h(4, "Kept"),
            h(6, "Deeper"),
        ];
        let outline = build_outline(&headings);
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].heading.title, "Main");
        assert_eq!(outline[0].children.len(), 1);
        let sub = &outline[0].children[0];
        assert_eq!(sub.heading.title, "Sub");
        let kept: Vec<_> = sub.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(kept, vec!["Kept"]);
    }

    #[test]
    fn test_h1_and_h2_are_siblings() {
        let outline = build_outline(&[h(1, "A"), h(2, "B"), h(3, "C"), h(1, "D")]);
        let titles: Vec<_> = outline.iter().map(|e| e.heading.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "D"]);
        assert!(!outline[0].is_collapsible());
        assert!(outline[1].is_collapsible());
    }

    #[test]
    fn test_child_scan_stops_at_next_sub() {
        let outline = build_outline(&[h(2, "M"), h(3, "S1"), h(4, "a"), h(3, "S2"), h(4, "b")]);
        assert_eq!(outline[0].children[0].children.len(), 1);
        assert_eq!(outline[0].children[0].children[0].title, "a");
        assert_eq!(outline[0].children[1].children[0].title, "b");
    }

    #[test]
    fn test_idempotent() {
        let md = "# A\n## B\n### C\n#### D\n## E";
        let first = synthesize_toc(&extract_headings(md, SourceMode::Markdown));
        let second = synthesize_toc(&extract_headings(md, SourceMode::Markdown));
        assert_eq!(first, second);
    }

    #[test]
    fn test_markup_escapes_titles() {
        let toc = synthesize_toc(&[HeadingRecord {
            level: 2,
            title: "<script>".into(),
            anchor: "script".into(),
        }]);
        assert!(toc.markup.contains("&lt;script&gt;"));
        assert!(!toc.markup.contains("<script>"));
    }

    #[test]
    fn test_options_label_and_expanded() {
        let options = TocOptions {
            label: "Contents".into(),
            collapsed: false,
        };
        let toc = synthesize_toc_with(&[h(2, "M"), h(3, "S")], &options);
        assert!(toc.markup.contains("<h3>Contents</h3>"));
        assert!(!toc.markup.contains("display: none"));
    }
}
