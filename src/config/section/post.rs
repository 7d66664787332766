//! `[post]` section configuration.
//!
//! ```toml
//! [post]
//! max_title_length = 100   # characters
//! excerpt_length = 100     # characters before "..."
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Post and draft validation limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub max_title_length: usize,
    pub excerpt_length: usize,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            max_title_length: 100,
            excerpt_length: 100,
        }
    }
}

impl PostConfig {
    pub const MAX_TITLE_LENGTH: FieldPath = FieldPath::new("post.max_title_length");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_title_length == 0 {
            diag.error(Self::MAX_TITLE_LENGTH, "must be greater than 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_post_config() {
        let config = test_parse_config("[post]\nmax_title_length = 40");
        assert_eq!(config.post.max_title_length, 40);
        assert_eq!(config.post.excerpt_length, 100);
    }
}
