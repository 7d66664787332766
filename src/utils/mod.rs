//! Shared helpers with no knowledge of posts or configuration.

pub mod date;
pub mod hash;
pub mod html;
pub mod mime;
pub mod path;
