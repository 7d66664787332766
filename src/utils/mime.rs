//! `Content-Type` values for the site files the editor backend serves.
//!
//! The static root holds the editor, the published blog pages, their covers
//! and images. Anything else is sent as `application/octet-stream`.

use std::path::Path;

pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const JSON: &str = "application/json; charset=utf-8";
    pub const SVG: &str = "image/svg+xml";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Lower-case extension to content type.
const BY_EXTENSION: &[(&str, &str)] = &[
    ("html", types::HTML),
    ("htm", types::HTML),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("json", types::JSON),
    ("md", "text/markdown; charset=utf-8"),
    ("txt", types::PLAIN),
    ("svg", types::SVG),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff2", "font/woff2"),
];

pub fn from_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            BY_EXTENSION
                .iter()
                .find(|(known, _)| ext.eq_ignore_ascii_case(known))
        })
        .map_or(types::OCTET_STREAM, |&(_, mime)| mime)
}
