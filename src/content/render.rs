//! Markdown to HTML rendering using pulldown-cmark.
//!
//! Headings are paired with the extractor's records by source line, so the
//! ids in the rendered page are exactly the anchors the table of contents
//! links to. `==text==` becomes `<mark>text</mark>` outside code.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::anchor::anchor_for;
use super::heading::{HeadingRecord, locate_markdown_headings};

/// Options for markdown conversion (`[markdown]` in `blog.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
    /// Enable heading attributes extension (e.g., `# Heading {#custom-id}`)
    pub heading_attributes: bool,
    /// Render `==text==` as `<mark>`
    pub highlight: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
            heading_attributes: true,
            highlight: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to pulldown-cmark Options
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.heading_attributes {
            opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        opts
    }
}

/// Rendered HTML body with the headings it links to.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub headings: Vec<HeadingRecord>,
}

/// Render Markdown to an HTML body with default options.
pub fn render_markdown(markdown: &str) -> String {
    render_markdown_with(markdown, &MarkdownOptions::default()).html
}

/// Render Markdown, returning the heading records alongside the HTML.
pub fn render_markdown_with(markdown: &str, options: &MarkdownOptions) -> Rendered {
    let (located, mut anchors) = locate_markdown_headings(markdown, options.heading_attributes);
    let by_line: FxHashMap<usize, &str> = located
        .iter()
        .map(|h| (h.line_start, h.record.anchor.as_str()))
        .collect();

    let mut events: Vec<Event<'_>> = Vec::new();
    // (index of the Start event, source offset) of the heading being read
    let mut open_heading: Option<(usize, usize)> = None;
    let mut heading_text = String::new();
    let mut heading_count = 0usize;

    let parser = Parser::new_ext(markdown, options.to_pulldown_options()).into_offset_iter();
    for (event, range) in parser {
        match &event {
            Event::Start(Tag::Heading { .. }) => {
                open_heading = Some((events.len(), range.start));
                heading_text.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((at, offset)) = open_heading.take()
                    && let Event::Start(Tag::Heading { id, .. }) = &mut events[at]
                    && id.is_none()
                {
                    let line_start = markdown[..offset].rfind('\n').map_or(0, |i| i + 1);
                    let anchor = match by_line.get(&line_start) {
                        Some(anchor) => (*anchor).to_string(),
                        None => anchors.claim(anchor_for(heading_text.trim(), heading_count)),
                    };
                    *id = Some(CowStr::from(anchor));
                }
                heading_count += 1;
            }
            Event::Text(text) | Event::Code(text) if open_heading.is_some() => {
                heading_text.push_str(text);
            }
            _ => {}
        }
        events.push(event);
    }

    let events = if options.highlight {
        mark_highlights(events)
    } else {
        events
    };

    let mut html_out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_out, events.into_iter());

    Rendered {
        html: html_out,
        headings: located.into_iter().map(|h| h.record).collect(),
    }
}

// ============================================================================
// ==highlight==
// ============================================================================

/// Merge adjacent text outside code blocks and split out `==marked==` runs.
fn mark_highlights(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut pending = String::new();
    let mut in_code_block = false;

    for event in events {
        if let Event::Text(text) = &event
            && !in_code_block
        {
            pending.push_str(text);
            continue;
        }

        flush_text(&mut out, &mut pending);
        match &event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            _ => {}
        }
        out.push(event);
    }

    flush_text(&mut out, &mut pending);
    out
}

fn flush_text(out: &mut Vec<Event<'_>>, pending: &mut String) {
    if pending.is_empty() {
        return;
    }

    let mut rest = pending.as_str();
    let mut plain = String::new();

    while let Some(open) = rest.find("==") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("==") else {
            break;
        };
        let inner = &after[..close];
        if inner.is_empty() || inner.starts_with(char::is_whitespace) || inner.ends_with(char::is_whitespace) {
            plain.push_str(&rest[..open + 2]);
            rest = after;
            continue;
        }

        plain.push_str(&rest[..open]);
        if !plain.is_empty() {
            out.push(Event::Text(CowStr::from(std::mem::take(&mut plain))));
        }
        out.push(Event::InlineHtml(CowStr::Borrowed("<mark>")));
        out.push(Event::Text(CowStr::from(inner.to_string())));
        out.push(Event::InlineHtml(CowStr::Borrowed("</mark>")));
        rest = &after[close + 2..];
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        out.push(Event::Text(CowStr::from(plain)));
    }
    pending.clear();
}
