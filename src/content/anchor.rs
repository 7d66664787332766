//! Heading anchor generation.
//!
//! Anchors keep CJK ideographs, ASCII letters and digits, joined by hyphens:
//!
//! | Title                  | Anchor              |
//! |------------------------|---------------------|
//! | `Getting Started`      | `getting-started`   |
//! | `【笔记】Rust 入门`     | `笔记rust-入门`      |
//! | `C++ & Go!`            | `c-go`              |
//! | `!!`                   | `heading-<index>`   |

use rustc_hash::FxHashSet;

/// Bracket glyphs removed before filtering.
const STRIPPED_BRACKETS: [char; 4] = ['【', '】', '[', ']'];

/// Anchors shorter than this fall back to `heading-<index>`.
const MIN_ANCHOR_CHARS: usize = 2;

/// CJK Unified Ideographs, basic block.
#[inline]
fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

#[inline]
fn is_kept(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_cjk_ideograph(c) || c.is_whitespace()
}

/// Slugify a heading title. May return an empty string.
pub fn slugify(title: &str) -> String {
    let filtered: String = title
        .chars()
        .filter(|c| !STRIPPED_BRACKETS.contains(c))
        .filter(|&c| is_kept(c))
        .collect();

    filtered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Anchor for the heading at `index` (0-based among headings extracted so far).
pub fn anchor_for(title: &str, index: usize) -> String {
    let slug = slugify(title);
    if slug.chars().count() < MIN_ANCHOR_CHARS {
        format!("heading-{index}")
    } else {
        slug
    }
}

/// Anchors issued within one document.
///
/// Generated anchors that collide with an issued one get the first free
/// `-1`, `-2`, ... suffix. Ids taken verbatim from markup are only recorded.
#[derive(Debug, Default)]
pub struct AnchorSet {
    issued: FxHashSet<String>,
}

impl AnchorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an anchor that must be kept as written.
    pub fn reserve(&mut self, anchor: &str) {
        self.issued.insert(anchor.to_string());
    }

    /// Issue `candidate`, suffixed when it is already taken.
    pub fn claim(&mut self, candidate: String) -> String {
        if self.issued.insert(candidate.clone()) {
            return candidate;
        }
        let unique = (1..)
            .map(|n| format!("{candidate}-{n}"))
            .find(|c| !self.issued.contains(c))
            .unwrap_or_default();
        self.issued.insert(unique.clone());
        unique
    }
}
