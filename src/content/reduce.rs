//! HTML to Markdown reduction using tl.
//!
//! Used to load a published post back into the editor. Lossy by nature:
//! tables flatten to `a | b` rows, unknown tags are stripped, attributes other
//! than `href`/`src`/`alt` and code languages are dropped.
//!
//! # Scope
//!
//! | Page shape                              | Reduced content              |
//! |-----------------------------------------|------------------------------|
//! | has `.markdown-content`                 | that element                 |
//! | has `.blog-main-content` only           | it, minus h2 / meta / images |
//! | full document                           | `<body>`                     |
//! | fragment                                | everything                   |

use tl::{HTMLTag, Node, NodeHandle, Parser, VDom};

use crate::utils::html;

/// Where to look for content and title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceOptions {
    /// Class of the element holding the rendered Markdown body.
    pub content_class: String,
    /// Class of the article wrapper (title, meta, cover, body).
    pub main_class: String,
    /// Suffix stripped from `<title>` (e.g. ` | Site Name`).
    pub title_suffix: Option<String>,
    /// Title used when the page has none (usually the file stem).
    pub fallback_title: Option<String>,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            content_class: "markdown-content".to_string(),
            main_class: "blog-main-content".to_string(),
            title_suffix: None,
            fallback_title: None,
        }
    }
}

/// Reduction result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduced {
    pub title: Option<String>,
    pub markdown: String,
}

/// Reduce HTML to Markdown with default options.
pub fn reduce_html_to_markdown(html_text: &str) -> String {
    reduce_html_with(html_text, &ReduceOptions::default()).markdown
}

/// Reduce HTML to Markdown, reporting the recovered title.
pub fn reduce_html_with(html_text: &str, options: &ReduceOptions) -> Reduced {
    if html_text.trim().is_empty() {
        return Reduced::default();
    }

    let Ok(dom) = tl::parse(html_text, tl::ParserOptions::default()) else {
        let text = html::unescape(&html::strip_tags(html_text)).trim().to_string();
        return Reduced {
            title: options.fallback_title.clone(),
            markdown: text,
        };
    };
    let parser = dom.parser();

    let scope = Scope::find(&dom, options);
    let title = find_title(&dom, &scope, options);

    let reducer = Reducer {
        parser,
        strip_article_chrome: matches!(scope, Scope::Main(_)),
    };
    let body = match scope {
        Scope::Content(handle) | Scope::Main(handle) | Scope::Body(handle) => {
            reducer.element_blocks(handle)
        }
        Scope::Document => reducer.blocks(dom.children()),
    };

    let mut markdown = collapse_blank_lines(&body);
    if let Some(title) = &title
        && !markdown.starts_with('#')
    {
        markdown = if markdown.is_empty() {
            format!("# {title}")
        } else {
            format!("# {title}\n\n{markdown}")
        };
    }

    Reduced { title, markdown }
}

/// Recover only the title of a post page.
pub fn extract_title(html_text: &str, options: &ReduceOptions) -> Option<String> {
    let dom = tl::parse(html_text, tl::ParserOptions::default()).ok()?;
    let scope = Scope::find(&dom, options);
    find_title(&dom, &scope, options)
}

// ============================================================================
// Scope and title
// ============================================================================

enum Scope {
    Content(NodeHandle),
    Main(NodeHandle),
    Body(NodeHandle),
    Document,
}

impl Scope {
    fn find(dom: &VDom<'_>, options: &ReduceOptions) -> Self {
        let first = |selector: &str| dom.query_selector(selector).and_then(|mut it| it.next());

        if let Some(handle) = first(&format!(".{}", options.content_class)) {
            Self::Content(handle)
        } else if let Some(handle) = first(&format!(".{}", options.main_class)) {
            Self::Main(handle)
        } else if let Some(handle) = first("body") {
            Self::Body(handle)
        } else {
            Self::Document
        }
    }
}

/// First `<h2>` outside the body content, else `<title>`, else the fallback.
///
/// Fragments (no wrapper, no body) never take their title from an `<h2>`:
/// those are section headings of the content itself.
fn find_title(dom: &VDom<'_>, scope: &Scope, options: &ReduceOptions) -> Option<String> {
    let parser = dom.parser();

    let from_h2 = match scope {
        Scope::Content(content) => {
            let inside = descendants(*content, parser);
            dom.query_selector("h2")
                .into_iter()
                .flatten()
                .find(|h| !inside.contains(&h.get_inner()))
        }
        Scope::Main(_) | Scope::Body(_) => dom.query_selector("h2").and_then(|mut it| it.next()),
        Scope::Document => None,
    };

    let h2_title = from_h2
        .and_then(|h| h.get(parser))
        .map(|node| clean_text(&node.inner_text(parser)))
        .filter(|t| !t.is_empty());

    h2_title
        .or_else(|| {
            let node = dom.query_selector("title")?.next()?.get(parser)?;
            let text = clean_text(&node.inner_text(parser));
            let text = match options.title_suffix.as_deref().map(str::trim) {
                Some(suffix) if !suffix.is_empty() => {
                    text.strip_suffix(suffix).map_or(text.as_str(), str::trim_end).to_string()
                }
                _ => text,
            };
            Some(text).filter(|t| !t.is_empty())
        })
        .or_else(|| options.fallback_title.clone())
}

/// Raw handle ids of every node under `root` (excluding `root`).
fn descendants(root: NodeHandle, parser: &Parser<'_>) -> Vec<u32> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(handle) = stack.pop() {
        let Some(tag) = handle.get(parser).and_then(Node::as_tag) else {
            continue;
        };
        for child in tag.children().top().as_slice().iter() {
            found.push(child.get_inner());
            stack.push(*child);
        }
    }
    found
}

/// Decode entities and collapse whitespace runs.
fn clean_text(text: &str) -> String {
    html::unescape(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Reducer
// ============================================================================

struct Reducer<'p, 'buf> {
    parser: &'p Parser<'buf>,
    /// Inside `.blog-main-content`: drop the title, meta line and cover image.
    strip_article_chrome: bool,
}

/// Elements that start a new Markdown block.
fn is_block(name: &str) -> bool {
    html::heading_level(name).is_some()
        || matches!(
            name,
            "p" | "div"
                | "section"
                | "article"
                | "main"
                | "header"
                | "footer"
                | "aside"
                | "nav"
                | "ul"
                | "ol"
                | "blockquote"
                | "pre"
                | "hr"
                | "table"
                | "figure"
                | "figcaption"
                | "details"
                | "summary"
                | "dl"
                | "dt"
                | "dd"
                | "body"
                | "html"
        )
}

/// Elements whose content is never Markdown.
fn is_dropped(name: &str) -> bool {
    matches!(
        name,
        "head" | "title" | "script" | "style" | "template" | "noscript" | "iframe" | "button"
    )
}

fn tag_name(tag: &HTMLTag<'_>) -> String {
    tag.name().as_utf8_str().to_ascii_lowercase()
}

fn attr_value(tag: &HTMLTag<'_>, name: &str) -> Option<String> {
    let value = tag.attributes().get(name).flatten()?;
    Some(html::unescape(&value.as_utf8_str()).into_owned())
}

impl Reducer<'_, '_> {
    fn tag(&self, handle: NodeHandle) -> Option<&HTMLTag<'_>> {
        handle.get(self.parser).and_then(Node::as_tag)
    }

    /// Elements removed from `.blog-main-content` when it is the scope.
    fn is_article_chrome(&self, name: &str, tag: &HTMLTag<'_>) -> bool {
        self.strip_article_chrome
            && (name == "h2"
                || name == "img"
                || (name == "p" && tag.attributes().is_class_member("post-meta")))
    }

    fn element_blocks(&self, handle: NodeHandle) -> String {
        match self.tag(handle) {
            Some(tag) => self.blocks(tag.children().top().as_slice()),
            None => String::new(),
        }
    }

    /// Render a mixed list of children as blank-line separated blocks.
    fn blocks(&self, handles: &[NodeHandle]) -> String {
        let mut blocks: Vec<String> = Vec::new();
        let mut inline = String::new();

        for handle in handles {
            let block_tag = self
                .tag(*handle)
                .map(|tag| (tag_name(tag), tag))
                .filter(|(name, _)| is_block(name));

            match block_tag {
                Some((name, tag)) => {
                    push_block(&mut blocks, std::mem::take(&mut inline));
                    if !self.is_article_chrome(&name, tag) {
                        push_block(&mut blocks, self.block(&name, tag));
                    }
                }
                None => inline.push_str(&self.inline(*handle)),
            }
        }
        push_block(&mut blocks, inline);

        blocks.join("\n\n")
    }

    fn block(&self, name: &str, tag: &HTMLTag<'_>) -> String {
        let children = tag.children();
        let children = children.top().as_slice();

        if let Some(level) = html::heading_level(name) {
            let text = self.inline_all(children);
            return format!("{} {}", "#".repeat(usize::from(level)), text.trim());
        }

        match name {
            "p" | "dt" | "dd" | "summary" | "figcaption" => self.inline_all(children).trim().to_string(),
            "ul" | "ol" => self.list(tag, name == "ol", ""),
            "blockquote" => {
                let inner = self.blocks(children);
                collapse_blank_lines(&inner)
                    .lines()
                    .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {line}") })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            "pre" => self.code_block(tag),
            "hr" => "---".to_string(),
            "table" => self.table(tag),
            _ => self.blocks(children),
        }
    }

    fn code_block(&self, pre: &HTMLTag<'_>) -> String {
        let code_tag = pre
            .children()
            .top()
            .as_slice()
            .iter()
            .filter_map(|h| self.tag(*h))
            .find(|t| tag_name(t) == "code");

        let language = code_tag
            .and_then(|code| attr_value(code, "class"))
            .and_then(|class| {
                class
                    .split_whitespace()
                    .find_map(|c| c.strip_prefix("language-").map(str::to_string))
            })
            .unwrap_or_default();

        let raw = pre.inner_text(self.parser);
        let code = html::unescape(&raw);
        format!("```{language}\n{}\n```", code.trim_end_matches('\n'))
    }

    fn list(&self, tag: &HTMLTag<'_>, ordered: bool, indent: &str) -> String {
        let mut number: u64 = if ordered {
            attr_value(tag, "start")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1)
        } else {
            1
        };

        let mut lines = Vec::new();
        for handle in tag.children().top().as_slice().iter() {
            let Some(item) = self.tag(*handle).filter(|t| tag_name(t) == "li") else {
                continue;
            };

            let marker = if ordered {
                format!("{number}. ")
            } else {
                "- ".to_string()
            };
            number += 1;

            let nested_indent = format!("{indent}{}", " ".repeat(marker.len()));
            let (text, nested) = self.list_item(item, &nested_indent);
            lines.push(format!("{indent}{marker}{text}"));
            lines.extend(nested);
        }

        lines.join("\n")
    }

    /// Item text (paragraphs joined) and nested list lines.
    fn list_item(&self, item: &HTMLTag<'_>, nested_indent: &str) -> (String, Vec<String>) {
        let mut text = String::new();
        let mut nested = Vec::new();

        for handle in item.children().top().as_slice().iter() {
            match self.tag(*handle).map(|t| (tag_name(t), t)) {
                Some((name, list)) if name == "ul" || name == "ol" => {
                    nested.push(self.list(list, name == "ol", nested_indent));
                }
                Some((name, para)) if name == "p" => {
                    if !text.trim().is_empty() {
                        text.push(' ');
                    }
                    text.push_str(self.inline_all(para.children().top().as_slice()).trim());
                }
                _ => text.push_str(&self.inline(*handle)),
            }
        }

        let text = text.split('\n').map(str::trim).collect::<Vec<_>>().join(" ");
        (text.trim().to_string(), nested)
    }

    fn table(&self, table: &HTMLTag<'_>) -> String {
        let mut rows = Vec::new();
        let mut stack: Vec<NodeHandle> = table.children().top().as_slice().iter().rev().copied().collect();

        while let Some(handle) = stack.pop() {
            let Some(tag) = self.tag(handle) else { continue };
            match tag_name(tag).as_str() {
                "tr" => {
                    let cells: Vec<String> = tag
                        .children()
                        .top()
                        .as_slice()
                        .iter()
                        .filter_map(|h| self.tag(*h))
                        .filter(|t| matches!(tag_name(t).as_str(), "td" | "th"))
                        .map(|cell| self.inline_all(cell.children().top().as_slice()).trim().to_string())
                        .collect();
                    if !cells.is_empty() {
                        rows.push(cells.join(" | "));
                    }
                }
                _ => stack.extend(tag.children().top().as_slice().iter().rev().copied()),
            }
        }

        rows.join("\n")
    }

    fn inline_all(&self, handles: &[NodeHandle]) -> String {
        handles.iter().map(|h| self.inline(*h)).collect()
    }

    /// Render one node as inline Markdown.
    fn inline(&self, handle: NodeHandle) -> String {
        let Some(node) = handle.get(self.parser) else {
            return String::new();
        };

        let tag = match node {
            Node::Raw(bytes) => return collapse_whitespace(&html::unescape(&bytes.as_utf8_str())),
            Node::Comment(_) => return String::new(),
            Node::Tag(tag) => tag,
        };

        let name = tag_name(tag);
        if is_dropped(&name) || self.is_article_chrome(&name, tag) {
            return String::new();
        }

        let children = tag.children();
        let inner = || self.inline_all(children.top().as_slice());
        let wrap = |mark: &str| {
            let text = inner();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                String::new()
            } else {
                format!("{mark}{trimmed}{mark}")
            }
        };

        match name.as_str() {
            "strong" | "b" => wrap("**"),
            "em" | "i" => wrap("*"),
            "del" | "s" | "strike" => wrap("~~"),
            "mark" => wrap("=="),
            "code" => {
                let code = html::unescape(&tag.inner_text(self.parser)).into_owned();
                if code.contains('`') {
                    format!("`` {code} ``")
                } else {
                    format!("`{code}`")
                }
            }
            "a" => {
                let text = inner();
                match attr_value(tag, "href") {
                    Some(href) if !href.is_empty() => format!("[{}]({href})", text.trim()),
                    _ => text,
                }
            }
            "img" => {
                let src = attr_value(tag, "src").unwrap_or_default();
                if src.is_empty() {
                    return String::new();
                }
                let alt = attr_value(tag, "alt").unwrap_or_default();
                format!("![{alt}]({src})")
            }
            "br" => "\n".to_string(),
            "input" => {
                let is_checkbox = attr_value(tag, "type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
                match (is_checkbox, tag.attributes().get("checked").is_some()) {
                    (true, true) => "[x] ".to_string(),
                    (true, false) => "[ ] ".to_string(),
                    _ => String::new(),
                }
            }
            _ if is_block(&name) => format!(" {} ", self.block(&name, tag)),
            _ => inner(),
        }
    }
}

fn push_block(blocks: &mut Vec<String>, block: String) {
    let trimmed = block.trim();
    if !trimmed.is_empty() {
        blocks.push(trimmed.to_string());
    }
}

/// Collapse whitespace runs to single spaces, keeping edge spaces.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{00A0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Limit blank runs to one empty line and trim the ends.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_end().to_string()
}
