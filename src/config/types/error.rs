//! Errors raised while loading `blog.toml`.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("blog.toml is not valid TOML")]
    Toml(#[from] toml::de::Error),

    // no #[from]: the report already carries every message
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// One rejected setting.
#[derive(Debug, Clone)]
struct Problem {
    field: FieldPath,
    message: String,
    hint: Option<String>,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} {}", format!("{}:", self.field.as_str()).cyan(), self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " {}", format!("({hint})").dimmed())?;
        }
        Ok(())
    }
}

/// Every rejected setting of one load, reported together.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    problems: Vec<Problem>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(field, message.into(), None);
    }

    pub fn error_with_hint(&mut self, field: FieldPath, message: impl Into<String>, hint: impl Into<String>) {
        self.push(field, message.into(), Some(hint.into()));
    }

    fn push(&mut self, field: FieldPath, message: String, hint: Option<String>) {
        self.problems.push(Problem { field, message, hint });
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.len() == 1 { "problem" } else { "problems" };
        write!(f, "{}", format!("blog.toml has {} {noun}:", self.len()).red().bold())?;
        for problem in &self.problems {
            write!(f, "\n{problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Io(PathBuf::from("blog.toml"), Error::new(ErrorKind::NotFound, "gone"));
        assert_eq!(err.to_string(), "cannot read config file `blog.toml`");

        let toml_err = toml::from_str::<toml::Value>("[site").unwrap_err();
        assert_eq!(ConfigError::from(toml_err).to_string(), "blog.toml is not valid TOML");
    }

    #[test]
    fn test_diagnostics_collect_all() {
        let mut diag = ConfigDiagnostics::new();
        assert!(diag.is_empty());

        diag.error(FieldPath::new("serve.workers"), "must be at least 1");
        diag.error_with_hint(FieldPath::new("paths.blog"), "must be relative", "use `blog`");
        assert_eq!(diag.len(), 2);

        let text = diag.to_string();
        assert!(text.contains("2 problems"));
        assert!(text.contains("serve.workers:"));
        assert!(text.contains("must be at least 1"));
        assert!(text.contains("(use `blog`)"));
        assert!(diag.into_result().is_err());
    }

    #[test]
    fn test_empty_diagnostics_pass() {
        assert!(ConfigDiagnostics::new().into_result().is_ok());
    }
}
