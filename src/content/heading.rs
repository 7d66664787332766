//! Heading extraction from Markdown and HTML sources.
//!
//! Markdown is read by a line scanner that understands fenced code blocks;
//! HTML by the streaming `TagScanner`. Both produce the same ordered
//! `HeadingRecord` list, with anchors assigned in one pass at the end so that
//! ids written in the source are never shadowed by generated ones.

use serde::{Deserialize, Serialize};

use super::anchor::{AnchorSet, anchor_for};
use crate::utils::html::{self, TagScanner, Token};

/// One heading of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRecord {
    /// 1..=6
    pub level: u8,
    /// Trimmed, entity-decoded text.
    pub title: String,
    /// Fragment id without `#`.
    pub anchor: String,
}

/// Source syntax handed to [`extract_headings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Markdown,
    Html,
}

/// Extract headings in document order.
///
/// Never fails: text without headings yields an empty list.
pub fn extract_headings(text: &str, mode: SourceMode) -> Vec<HeadingRecord> {
    extract_headings_with(text, mode, true)
}

/// Like [`extract_headings`]; `attributes` says whether a trailing
/// `{#id .class}` block on a Markdown heading is syntax or title text.
pub fn extract_headings_with(text: &str, mode: SourceMode, attributes: bool) -> Vec<HeadingRecord> {
    match mode {
        SourceMode::Markdown => locate_markdown_headings(text, attributes)
            .0
            .into_iter()
            .map(|h| h.record)
            .collect(),
        SourceMode::Html => assign_anchors(scan_html(text)).0,
    }
}

// ============================================================================
// Anchor assignment
// ============================================================================

/// A heading before its anchor is decided.
#[derive(Debug)]
struct RawHeading {
    level: u8,
    title: String,
    explicit_id: Option<String>,
    /// Byte offset of the source line (Markdown only).
    line_start: usize,
}

/// Source-verbatim ids are reserved first; the rest are generated in order.
fn assign_anchors(raw: Vec<RawHeading>) -> (Vec<HeadingRecord>, Vec<usize>, AnchorSet) {
    let mut anchors = AnchorSet::new();
    for id in raw.iter().filter_map(|h| h.explicit_id.as_deref()) {
        anchors.reserve(id);
    }

    let mut records = Vec::with_capacity(raw.len());
    let mut lines = Vec::with_capacity(raw.len());
    for (index, heading) in raw.into_iter().enumerate() {
        let anchor = match heading.explicit_id {
            Some(id) => id,
            None => anchors.claim(anchor_for(&heading.title, index)),
        };
        lines.push(heading.line_start);
        records.push(HeadingRecord {
            level: heading.level,
            title: heading.title,
            anchor,
        });
    }
    (records, lines, anchors)
}

// ============================================================================
// Markdown scanner
// ============================================================================

/// A Markdown heading together with the byte offset of its line.
#[derive(Debug, Clone)]
pub struct LocatedHeading {
    pub line_start: usize,
    pub record: HeadingRecord,
}

/// Scan Markdown headings, also returning every anchor issued.
///
/// The renderer uses the line offsets to pair parser headings with records,
/// and the anchor set to mint non-colliding ids for headings this scanner
/// does not see (setext, block quotes).
pub fn locate_markdown_headings(text: &str, attributes: bool) -> (Vec<LocatedHeading>, AnchorSet) {
    let (records, lines, anchors) = assign_anchors(scan_markdown(text, attributes));
    let located = lines
        .into_iter()
        .zip(records)
        .map(|(line_start, record)| LocatedHeading { line_start, record })
        .collect();
    (located, anchors)
}

/// An open code fence: marker byte and run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: u8,
    len: usize,
}

impl Fence {
    fn open(line: &str) -> Option<Self> {
        let body = strip_indent(line)?;
        let marker = *body.as_bytes().first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }
        let len = body.bytes().take_while(|&b| b == marker).count();
        if len < 3 || (marker == b'`' && body[len..].contains('`')) {
            return None;
        }
        Some(Self { marker, len })
    }

    fn is_closed_by(self, line: &str) -> bool {
        let Some(body) = strip_indent(line) else {
            return false;
        };
        let run = body.bytes().take_while(|&b| b == self.marker).count();
        run >= self.len && body[run..].trim().is_empty()
    }
}

fn scan_markdown(text: &str, attributes: bool) -> Vec<RawHeading> {
    let mut headings = Vec::new();
    let mut fence: Option<Fence> = None;
    let mut offset = 0;

    for raw_line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches(['\n', '\r']);

        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = Fence::open(line) {
            fence = Some(open);
            continue;
        }

        if let Some((level, title, explicit_id)) = parse_atx(line, attributes) {
            headings.push(RawHeading {
                level,
                title,
                explicit_id,
                line_start,
            });
        }
    }

    headings
}

/// Up to three leading spaces are indentation; more (or a tab) is code.
fn strip_indent(line: &str) -> Option<&str> {
    let spaces = line.bytes().take_while(|&b| b == b' ').count();
    if spaces > 3 || line[spaces..].starts_with('\t') {
        return None;
    }
    Some(&line[spaces..])
}

/// Parse an ATX heading line: `## Title`, `## Title ##`, `## Title {#id}`.
fn parse_atx(line: &str, attributes: bool) -> Option<(u8, String, Option<String>)> {
    let body = strip_indent(line)?;
    let hashes = body.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }

    let rest = &body[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    let (text, explicit_id) = if attributes {
        split_attribute_block(rest.trim())
    } else {
        (rest.trim(), None)
    };
    // The renderer drops a closing `#` run too, so `## Title ##` is "Title".
    let title = html::unescape(strip_closing_hashes(text)).trim().to_string();
    if title.is_empty() {
        return None;
    }

    Some((u8::try_from(hashes).ok()?, title, explicit_id))
}

/// `Title ###` → `Title`; `C#` stays as written.
fn strip_closing_hashes(title: &str) -> &str {
    let without = title.trim_end_matches('#');
    if without.len() == title.len() {
        title
    } else if without.is_empty() {
        without
    } else if without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        title
    }
}

/// Split a trailing `{...}` block off a heading.
///
/// Any brace block counts unless it contains one of `{}<>\\`, and the last
/// `#id` token wins. pulldown-cmark reads the block the same way, so the
/// record matches the rendered `<hN>`.
fn split_attribute_block(text: &str) -> (&str, Option<String>) {
    let Some(inner_end) = text.strip_suffix('}') else {
        return (text, None);
    };
    let Some(open) = inner_end.rfind(['{', '}', '<', '>', '\\']) else {
        return (text, None);
    };
    if !inner_end[open..].starts_with('{') {
        return (text, None);
    }

    let id = inner_end[open + 1..]
        .split_ascii_whitespace()
        .filter(|token| token.len() > 1)
        .filter_map(|token| token.strip_prefix('#'))
        .last()
        .map(str::to_string);
    (inner_end[..open].trim_end(), id)
}

// ============================================================================
// HTML scanner
// ============================================================================

struct OpenHeading {
    level: u8,
    id: Option<String>,
    text: String,
}

fn scan_html(html_text: &str) -> Vec<RawHeading> {
    let mut headings = Vec::new();
    let mut open: Option<OpenHeading> = None;

    for item in TagScanner::new(html_text) {
        match item.token {
            Token::Open { name, attrs, .. } if open.is_none() => {
                if let Some(level) = html::heading_level(name) {
                    open = Some(OpenHeading {
                        level,
                        id: html::attr(attrs, "id").filter(|id| !id.trim().is_empty()),
                        text: String::new(),
                    });
                }
            }
            Token::Text(text) => {
                if let Some(heading) = open.as_mut() {
                    heading.text.push_str(text);
                }
            }
            Token::Close { name } => {
                if let Some(level) = html::heading_level(name)
                    && let Some(heading) = open.take_if(|h| h.level == level)
                {
                    let decoded = html::unescape(&heading.text);
                    let title = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !title.is_empty() {
                        headings.push(RawHeading {
                            level,
                            title,
                            explicit_id: heading.id,
                            line_start: item.span.start,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    headings
}
