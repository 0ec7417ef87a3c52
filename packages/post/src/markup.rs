//! Inline formatting applied to markers.

use serde::{Deserialize, Serialize};

/// An inline markup (strong, em, a, …) with optional attributes.
///
/// A marker carries its markups outermost-first; rendering wraps the
/// marker's text node in one element per markup, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markup {
    pub tag: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl Markup {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Link markup with an `href`.
pub fn anchor(href: impl Into<String>) -> Markup {
    Markup::new("a").with_attribute("href", href)
}
