//! Configuration section definitions.
//!
//! Each module corresponds to a section in `blog.toml`:
//!
//! | Module   | TOML Section | Purpose                              |
//! |----------|--------------|--------------------------------------|
//! | `site`   | `[site]`     | Author, title suffix, dates, covers  |
//! | `paths`  | `[paths]`    | Site directory layout                |
//! | `serve`  | `[serve]`    | Editor backend server                |
//! | `post`   | `[post]`     | Title and excerpt limits             |
//! | `toc`    | `[toc]`      | Table of contents markup             |
//! | `cover`  | `[cover]`    | Generated cover images               |
//! | `reduce` | `[reduce]`   | HTML to Markdown reduction           |
//!
//! `[markdown]` deserializes straight into [`crate::content::MarkdownOptions`].

mod cover;
mod paths;
mod post;
mod reduce;
mod serve;
mod site;
mod toc;

pub use cover::CoverConfig;
pub use paths::PathsConfig;
pub use post::PostConfig;
pub use reduce::ReduceConfig;
pub use serve::ServeConfig;
pub use site::SiteConfig;
pub use toc::TocConfig;
