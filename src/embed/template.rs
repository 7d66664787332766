//! Template types for typed variable injection.

use std::borrow::Cow;
use std::marker::PhantomData;

/// Trait for template variable sets
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Template with typed variable injection
///
/// Built-in templates are `&'static str`; site overrides are loaded once at
/// startup and owned.
#[derive(Debug, Clone)]
pub struct Template<V> {
    content: Cow<'static, str>,
    _marker: PhantomData<fn(&V)>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content: Cow::Borrowed(content),
            _marker: PhantomData,
        }
    }

    pub fn owned(content: String) -> Self {
        Self {
            content: Cow::Owned(content),
            _marker: PhantomData,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.content, Cow::Borrowed(_))
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(&self.content)
    }
}
