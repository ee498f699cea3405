//! Element locators.
//!
//! ```ignore
//! use nav_resolver::By;
//!
//! let layer = By::id("register_Layer");
//! let card = By::css("div.company-card > a");
//! let cta = By::partial_text("Explore companies");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// By
// ============================================================================

/// Element locator strategy.
///
/// Serializes as `{"strategy": "...", "value": "..."}`, which is also the
/// shape of the `element.find` params.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "value")]
pub enum By {
    /// CSS selector.
    #[serde(rename = "css")]
    Css(String),

    /// Element ID, equivalent to `#id`.
    #[serde(rename = "id")]
    Id(String),

    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath(String),

    /// Element whose trimmed `textContent` equals the value.
    #[serde(rename = "text")]
    Text(String),

    /// Element whose `textContent` contains the value.
    #[serde(rename = "partialText")]
    PartialText(String),

    /// `<a>` element whose text equals the value.
    #[serde(rename = "linkText")]
    LinkText(String),
}

impl By {
    /// Creates a CSS selector.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an ID selector.
    #[inline]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Creates an XPath selector.
    #[inline]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Creates an exact text selector.
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a partial text selector.
    #[inline]
    pub fn partial_text(text: impl Into<String>) -> Self {
        Self::PartialText(text.into())
    }

    /// Creates a link text selector.
    #[inline]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Returns the strategy name used on the wire.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::Id(_) => "id",
            Self::XPath(_) => "xpath",
            Self::Text(_) => "text",
            Self::PartialText(_) => "partialText",
            Self::LinkText(_) => "linkText",
        }
    }

    /// Returns the locator value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v)
            | Self::Id(v)
            | Self::XPath(v)
            | Self::Text(v)
            | Self::PartialText(v)
            | Self::LinkText(v) => v,
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy(), self.value())
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&str> for By {
    /// Plain strings are CSS selectors.
    fn from(s: &str) -> Self {
        Self::Css(s.to_string())
    }
}

impl From<String> for By {
    fn from(s: String) -> Self {
        Self::Css(s)
    }
}

// ============================================================================
// Tests
// ============================================================================
