//! HTML utility functions.
//!
//! Provides common HTML processing functions:
//! - `escape()`, `escape_attr()`, `unescape()` - HTML entity handling
//! - `is_void_element()`, `is_raw_text_element()` - element classification
//! - `parse_attributes()`, `attr()`, `has_class()` - attribute parsing
//! - `TagScanner` - streaming tag tokenizer with byte spans
//! - `find_by_class()`, `find_first_by_tag()`, `strip_tags()` - span queries built on the scanner

use std::borrow::Cow;
use std::ops::Range;

// =============================================================================
// HTML Escaping
// =============================================================================

/// Characters that require HTML escaping.
const ESCAPE_CHARS: [char; 5] = ['<', '>', '&', '"', '\''];

/// Get the HTML entity for a special character.
#[inline]
fn escape_char(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '&' => Some("&amp;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#39;"),
        _ => None,
    }
}

/// Escape HTML special characters in text content.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
pub fn escape(s: &str) -> Cow<'_, str> {
    escape_with(s, &ESCAPE_CHARS)
}

/// Escape HTML attribute values.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, &ESCAPE_CHARS)
}

#[inline]
fn escape_with<'a>(s: &'a str, chars: &[char]) -> Cow<'a, str> {
    if !s.contains(chars) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match escape_char(c) {
            Some(entity) => result.push_str(entity),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Longest entity body we try to decode (`#x10FFFF`, `hellip`).
const MAX_ENTITY_LEN: usize = 10;

/// Unescape HTML entities back to characters.
///
/// Handles common named entities and numeric character references.
/// Anything that does not form a known entity is copied through untouched.
pub fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|&(_, c)| c == ';')
            .and_then(|(end, _)| decode_entity(&after[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                result.push(c);
                rest = &after[end + 1..];
            }
            None => {
                result.push('&');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    Cow::Owned(result)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        "copy" => Some('©'),
        "hellip" => Some('…'),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// =============================================================================
// Element Classification
// =============================================================================

/// Check if an HTML tag is a void element (never has a closing tag).
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag is a raw text element (content is not markup).
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

/// Heading level for `h1`..`h6`, if `tag` is one.
#[inline]
pub fn heading_level(tag: &str) -> Option<u8> {
    let bytes = tag.as_bytes();
    match bytes {
        [h, d @ b'1'..=b'6'] if h.eq_ignore_ascii_case(&b'h') => Some(d - b'0'),
        _ => None,
    }
}

// =============================================================================
// Attribute Parsing
// =============================================================================

/// Parse HTML-style attributes from a string.
///
/// Input: `href="/a" class='foo bar' data-x=3 disabled`
/// Output: `[("href", "/a"), ("class", "foo bar"), ("data-x", "3"), ("disabled", "")]`
pub fn parse_attributes(s: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() || c == '/' {
            continue;
        }

        let mut name = String::new();
        name.push(c);
        while let Some(&next) = chars.peek() {
            if next == '=' || next == '/' || next.is_whitespace() {
                break;
            }
            name.push(next);
            chars.next();
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        if chars.peek() != Some(&'=') {
            attrs.push((name, String::new()));
            continue;
        }
        chars.next();

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut value = String::new();
        match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                for c in chars.by_ref() {
                    if c == quote {
                        break;
                    }
                    value.push(c);
                }
            }
            _ => {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }
        attrs.push((name, value));
    }

    attrs
}

/// Look up one attribute value (name compared case-insensitively, entities decoded).
pub fn attr(attrs: &str, name: &str) -> Option<String> {
    parse_attributes(attrs)
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| unescape(&value).into_owned())
}

/// Check whether the `class` attribute lists `class`.
pub fn has_class(attrs: &str, class: &str) -> bool {
    attr(attrs, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

// =============================================================================
// Tag Scanner
// =============================================================================

/// One lexical unit of an HTML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `<name attrs>` or `<name attrs/>`
    Open {
        name: &'a str,
        attrs: &'a str,
        self_closing: bool,
    },
    /// `</name>`
    Close { name: &'a str },
    /// Character data between tags (entities still encoded).
    Text(&'a str),
    /// Body of `<script>`/`<style>`.
    RawText(&'a str),
    /// Comments, doctype and processing instructions.
    Comment(&'a str),
}

impl Token<'_> {
    /// Whether this opens an element that will be closed later.
    pub fn opens_element(&self) -> bool {
        matches!(self, Token::Open { name, self_closing: false, .. } if !is_void_element(name))
    }
}

/// A token with its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token<'a>,
    pub span: Range<usize>,
}

/// Streaming tokenizer over an HTML string.
///
/// Never fails: anything that does not form a tag is emitted as text.
/// Tag names are returned as written; compare them case-insensitively.
pub struct TagScanner<'a> {
    src: &'a str,
    pos: usize,
    raw_until: Option<&'a str>,
}

impl<'a> TagScanner<'a> {
    pub const fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            raw_until: None,
        }
    }

    fn emit(&mut self, token: Token<'a>, len: usize) -> Spanned<'a> {
        let start = self.pos;
        self.pos += len;
        Spanned {
            token,
            span: start..self.pos,
        }
    }
}

impl<'a> Iterator for TagScanner<'a> {
    type Item = Spanned<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.src[self.pos..];
        if rest.is_empty() {
            return None;
        }

        if let Some(name) = self.raw_until.take() {
            let end = find_closing_tag(rest, name);
            if end > 0 {
                return Some(self.emit(Token::RawText(&rest[..end]), end));
            }
        }

        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").map_or(rest.len(), |i| i + 7);
            return Some(self.emit(Token::Comment(&rest[..end]), end));
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            return Some(self.emit(Token::Comment(&rest[..end]), end));
        }

        if let Some((token, len)) = scan_tag(rest) {
            if let Token::Open {
                name,
                self_closing: false,
                ..
            } = token
                && is_raw_text_element(name)
            {
                self.raw_until = Some(name);
            }
            return Some(self.emit(token, len));
        }

        // Text runs to the next '<' that can start markup
        let mut end = usize::from(rest.starts_with('<'));
        loop {
            match rest[end..].find('<') {
                Some(i) if starts_markup(&rest[end + i..]) => {
                    end += i;
                    break;
                }
                Some(i) => end += i + 1,
                None => {
                    end = rest.len();
                    break;
                }
            }
        }
        Some(self.emit(Token::Text(&rest[..end]), end))
    }
}

/// Whether `s` (starting at '<') looks like a tag, comment or declaration.
fn starts_markup(s: &str) -> bool {
    s[1..]
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

/// Try to read one open or close tag at the start of `rest`.
fn scan_tag(rest: &str) -> Option<(Token<'_>, usize)> {
    let body = rest.strip_prefix('<')?;
    let (closing, body) = match body.strip_prefix('/') {
        Some(b) => (true, b),
        None => (false, body),
    };

    if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(body.len());
    let name = &body[..name_len];

    let end = find_tag_end(&body[name_len..])?;
    let inner = &body[name_len..name_len + end];
    let consumed = 1 + usize::from(closing) + name_len + end + 1;

    if closing {
        return Some((Token::Close { name }, consumed));
    }

    let trimmed = inner.trim();
    let self_closing = trimmed.ends_with('/');
    let attrs = trimmed.trim_end_matches('/').trim_end();
    Some((
        Token::Open {
            name,
            attrs,
            self_closing,
        },
        consumed,
    ))
}

/// Offset of the `>` ending a tag, skipping quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (None, '>') => return Some(i),
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if q == c => quote = None,
            _ => {}
        }
    }
    None
}

/// Offset of `</name` in `rest` (case-insensitive), or `rest.len()`.
fn find_closing_tag(rest: &str, name: &str) -> usize {
    let mut from = 0;
    while let Some(off) = rest[from..].find("</") {
        let at = from + off;
        let after = &rest.as_bytes()[at + 2..];
        if after.len() >= name.len() && after[..name.len()].eq_ignore_ascii_case(name.as_bytes()) {
            return at;
        }
        from = at + 2;
    }
    rest.len()
}

// =============================================================================
// Span Queries
// =============================================================================

/// Byte ranges of one element: the whole element and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    pub outer: Range<usize>,
    pub inner: Range<usize>,
    /// Attribute text of the opening tag.
    pub attrs: Range<usize>,
}

/// Find every outermost element whose class list contains `class`.
///
/// Unclosed elements extend to the end of the input.
pub fn find_by_class(html: &str, class: &str) -> Vec<ElementSpan> {
    let mut found = Vec::new();
    let mut scanner = TagScanner::new(html);

    while let Some(item) = scanner.next() {
        let Token::Open { name, attrs, .. } = item.token else {
            continue;
        };
        if !item.token.opens_element() || !has_class(attrs, class) {
            continue;
        }

        let attrs_start = attrs.as_ptr() as usize - html.as_ptr() as usize;
        let (inner_end, outer_end) = close_element(&mut scanner, name, html.len());
        found.push(ElementSpan {
            outer: item.span.start..outer_end,
            inner: item.span.end..inner_end,
            attrs: attrs_start..attrs_start + attrs.len(),
        });
    }

    found
}

/// First element whose class list contains `class`.
pub fn find_first_by_class(html: &str, class: &str) -> Option<ElementSpan> {
    find_first(html, |_, attrs| has_class(attrs, class))
}

/// First `<tag>` element.
pub fn find_first_by_tag(html: &str, tag: &str) -> Option<ElementSpan> {
    find_first(html, |name, _| name.eq_ignore_ascii_case(tag))
}

fn find_first(html: &str, matches: impl Fn(&str, &str) -> bool) -> Option<ElementSpan> {
    let mut scanner = TagScanner::new(html);
    while let Some(item) = scanner.next() {
        if let Token::Open { name, attrs, .. } = item.token
            && item.token.opens_element()
            && matches(name, attrs)
        {
            let attrs_start = attrs.as_ptr() as usize - html.as_ptr() as usize;
            let (inner_end, outer_end) = close_element(&mut scanner, name, html.len());
            return Some(ElementSpan {
                outer: item.span.start..outer_end,
                inner: item.span.end..inner_end,
                attrs: attrs_start..attrs_start + attrs.len(),
            });
        }
    }
    None
}

/// Advance `scanner` past the close tag matching an already-consumed `<name>`.
///
/// Returns `(content_end, element_end)`.
fn close_element(scanner: &mut TagScanner<'_>, name: &str, len: usize) -> (usize, usize) {
    let mut depth = 1usize;
    for item in scanner.by_ref() {
        match item.token {
            Token::Open { name: n, .. } if n.eq_ignore_ascii_case(name) && item.token.opens_element() => {
                depth += 1;
            }
            Token::Close { name: n } if n.eq_ignore_ascii_case(name) => {
                depth -= 1;
                if depth == 0 {
                    return (item.span.start, item.span.end);
                }
            }
            _ => {}
        }
    }
    (len, len)
}

/// Text content of an HTML fragment: tags, comments and script/style bodies dropped.
///
/// Entities are left encoded; pass the result through `unescape` when needed.
pub fn strip_tags(html: &str) -> String {
    TagScanner::new(html)
        .filter_map(|item| match item.token {
            Token::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
