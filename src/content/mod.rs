//! Content transforms: heading extraction, TOC synthesis, Markdown rendering
//! and HTML reduction.
//!
//! All functions here are pure: they take text and return text, so they are
//! safe to call from any number of request threads at once.

pub mod anchor;
pub mod heading;
pub mod reduce;
pub mod render;
pub mod toc;

pub use heading::{HeadingRecord, SourceMode, extract_headings, extract_headings_with};
pub use reduce::{ReduceOptions, extract_title, reduce_html_to_markdown, reduce_html_with};
pub use render::{MarkdownOptions, render_markdown, render_markdown_with};
pub use toc::{Toc, TocOptions, synthesize_toc, synthesize_toc_with};
