//! `render`, `toc` and `reduce`: the content transforms as filters.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

use super::args::IoArgs;
use super::common::{input_stem, read_input, source_mode_for, write_output};
use crate::config::BlogConfig;
use crate::content::{
    HeadingRecord, MarkdownOptions, ReduceOptions, SourceMode, TocOptions, extract_headings,
    extract_headings_with, reduce_html_to_markdown, reduce_html_with, render_markdown,
    render_markdown_with, synthesize_toc, synthesize_toc_with, toc::TocEntry,
};

/// Markdown in, HTML body out.
pub fn render(io: &IoArgs, config: &BlogConfig) -> Result<()> {
    let markdown = read_input(io.input.as_deref())?;
    let html = if config.markdown == MarkdownOptions::default() {
        render_markdown(&markdown)
    } else {
        render_markdown_with(&markdown, &config.markdown).html
    };
    write_output(io.output.as_deref(), &html)
}

#[derive(Serialize)]
struct TocReport<'a> {
    headings: &'a [HeadingRecord],
    outline: &'a [TocEntry],
}

/// Headings of a document as an indented list, JSON, or TOC markup.
pub fn toc(io: &IoArgs, mode: Option<SourceMode>, html: bool, json: bool, config: &BlogConfig) -> Result<()> {
    let input = io.input.as_deref();
    let text = read_input(input)?;
    let mode = mode.unwrap_or_else(|| source_mode_for(input));

    let headings = if config.markdown.heading_attributes {
        extract_headings(&text, mode)
    } else {
        extract_headings_with(&text, mode, false)
    };
    let options = config.toc.options();
    let toc = if options == TocOptions::default() {
        synthesize_toc(&headings)
    } else {
        synthesize_toc_with(&headings, &options)
    };

    let output = if html {
        toc.markup
    } else if json {
        serde_json::to_string_pretty(&TocReport {
            headings: &headings,
            outline: &toc.outline,
        })?
    } else {
        heading_list(&headings)
    };
    write_output(io.output.as_deref(), &output)
}

/// HTML in, Markdown out.
pub fn reduce(io: &IoArgs, config: &BlogConfig) -> Result<()> {
    let input = io.input.as_deref();
    let html = read_input(input)?;
    let stem = input_stem(input);
    let options = config.reduce.options(&config.site, stem.as_deref());
    let markdown = if options == ReduceOptions::default() {
        reduce_html_to_markdown(&html)
    } else {
        reduce_html_with(&html, &options).markdown
    };
    write_output(io.output.as_deref(), &markdown)
}

/// One line per heading, indented by level relative to the shallowest one.
fn heading_list(headings: &[HeadingRecord]) -> String {
    let base = headings.iter().map(|h| h.level).min().unwrap_or(1);
    let mut out = String::new();
    for heading in headings {
        let indent = "  ".repeat(usize::from(heading.level - base));
        let _ = writeln!(out, "{indent}- {} (#{})", heading.title, heading.anchor);
    }
    out
}
