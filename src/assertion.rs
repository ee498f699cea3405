//! URL and content expectations.
//!
//! Expectations are retried against the live context until they hold or the
//! wait budget runs out, then fail with [`Error::AssertionFailure`] carrying
//! the last observed value.
//!
//! ```ignore
//! let url = UrlExpectation::contains("/registration/createAccount");
//! expect_url(&page, &url, Wait::new(Duration::from_secs(30))).await?;
//!
//! let text = TextExpectation::matches("(?i)Top Companies|Companies Hiring")?;
//! expect_text(&page, &text, Wait::default()).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use regex::{Regex, RegexBuilder};
use tracing::debug;
use url::Url;

use crate::context::AutomationContext;
use crate::error::{Error, Result};
use crate::wait::{Polled, Probe, Wait, poll};

// ============================================================================
// Constants
// ============================================================================

/// Page text longer than this is truncated in failure messages.
const MAX_ACTUAL_TEXT: usize = 200;

// ============================================================================
// UrlExpectation
// ============================================================================

/// Expectation on the current URL.
#[derive(Debug, Clone)]
pub enum UrlExpectation {
    /// URL contains the substring.
    Contains(String),
    /// URL equals the value after normalization (`https://a.com` equals
    /// `https://a.com/`).
    Equals(String),
    /// URL matches the pattern.
    Matches(Regex),
}

impl UrlExpectation {
    /// URL contains `fragment`.
    #[inline]
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    /// URL equals `url`.
    #[inline]
    pub fn equals(url: impl Into<String>) -> Self {
        Self::Equals(url.into())
    }

    /// URL matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Regex`] if the pattern is invalid.
    pub fn matches(pattern: &str) -> Result<Self> {
        Ok(Self::Matches(Regex::new(pattern)?))
    }

    /// Checks a URL against the expectation.
    #[must_use]
    pub fn is_satisfied_by(&self, url: &str) -> bool {
        match self {
            Self::Contains(fragment) => url.contains(fragment.as_str()),
            Self::Equals(expected) => normalize_url(url) == normalize_url(expected),
            Self::Matches(re) => re.is_match(url),
        }
    }
}

impl fmt::Display for UrlExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(fragment) => write!(f, "url contains {fragment:?}"),
            Self::Equals(url) => write!(f, "url equals {url:?}"),
            Self::Matches(re) => write!(f, "url matches /{}/", re.as_str()),
        }
    }
}

fn normalize_url(url: &str) -> String {
    Url::parse(url).map_or_else(|_| url.to_string(), String::from)
}

// ============================================================================
// TextExpectation
// ============================================================================

#[derive(Debug, Clone)]
enum TextMatcher {
    Literal { text: String, ignore_case: bool },
    Pattern(Regex),
}

/// Expectation on the rendered page text.
///
/// Literal matching collapses whitespace runs on both sides first, so text
/// split across elements or lines still matches.
#[derive(Debug, Clone)]
pub struct TextExpectation {
    matcher: TextMatcher,
}

impl TextExpectation {
    /// Page text contains `text` (case-sensitive).
    #[must_use]
    pub fn contains(text: impl Into<String>) -> Self {
        Self {
            matcher: TextMatcher::Literal {
                text: collapse_whitespace(&text.into()),
                ignore_case: false,
            },
        }
    }

    /// Page text contains `text`, ignoring case.
    #[must_use]
    pub fn contains_ignore_case(text: impl Into<String>) -> Self {
        Self {
            matcher: TextMatcher::Literal {
                text: collapse_whitespace(&text.into()).to_lowercase(),
                ignore_case: true,
            },
        }
    }

    /// Page text matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Regex`] if the pattern is invalid.
    pub fn matches(pattern: &str) -> Result<Self> {
        Ok(Self {
            matcher: TextMatcher::Pattern(Regex::new(pattern)?),
        })
    }

    /// Page text matches any of `alternatives`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Regex`] if the combined pattern is too large.
    pub fn any_of_ignore_case<I, S>(alternatives: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pattern = alternatives
            .into_iter()
            .map(|s| regex::escape(s.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let re = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        Ok(Self {
            matcher: TextMatcher::Pattern(re),
        })
    }

    /// Checks page text against the expectation.
    #[must_use]
    pub fn is_satisfied_by(&self, page_text: &str) -> bool {
        match &self.matcher {
            TextMatcher::Literal { text, ignore_case } => {
                let haystack = collapse_whitespace(page_text);
                if *ignore_case {
                    haystack.to_lowercase().contains(text.as_str())
                } else {
                    haystack.contains(text.as_str())
                }
            }
            TextMatcher::Pattern(re) => re.is_match(page_text),
        }
    }
}

impl fmt::Display for TextExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            TextMatcher::Literal {
                text,
                ignore_case: false,
            } => write!(f, "page contains {text:?}"),
            TextMatcher::Literal {
                text,
                ignore_case: true,
            } => write!(f, "page contains {text:?} (any case)"),
            TextMatcher::Pattern(re) => write!(f, "page matches /{}/", re.as_str()),
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    match collapsed.char_indices().nth(MAX_ACTUAL_TEXT) {
        Some((end, _)) => format!("{}...", &collapsed[..end]),
        None => collapsed,
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Waits until the current URL satisfies `expectation`; returns that URL.
///
/// # Errors
///
/// - [`Error::AssertionFailure`] with the last observed URL on timeout
/// - Context errors while reading the URL
pub async fn expect_url<C>(ctx: &C, expectation: &UrlExpectation, wait: Wait) -> Result<String>
where
    C: AutomationContext + ?Sized,
{
    let polled = poll(wait, || async move {
        let url = ctx.current_url().await?;
        if expectation.is_satisfied_by(&url) {
            Ok(Probe::Ready(url))
        } else {
            Ok(Probe::Pending(Some(url)))
        }
    })
    .await?;

    match polled {
        Polled::Ready(url) => {
            debug!(%url, %expectation, "URL expectation met");
            Ok(url)
        }
        Polled::Expired { last } => Err(Error::assertion(
            "url",
            expectation.to_string(),
            last.unwrap_or_default(),
        )),
    }
}

/// Waits until the page text satisfies `expectation`.
///
/// # Errors
///
/// - [`Error::AssertionFailure`] with the (truncated) last page text on timeout
/// - Context errors while reading the text
pub async fn expect_text<C>(ctx: &C, expectation: &TextExpectation, wait: Wait) -> Result<()>
where
    C: AutomationContext + ?Sized,
{
    let polled = poll(wait, || async move {
        let text = ctx.page_text().await?;
        if expectation.is_satisfied_by(&text) {
            Ok(Probe::Ready(()))
        } else {
            Ok(Probe::Pending(Some(truncate(&text))))
        }
    })
    .await?;

    match polled {
        Polled::Ready(()) => {
            debug!(%expectation, "Content expectation met");
            Ok(())
        }
        Polled::Expired { last } => Err(Error::assertion(
            "content",
            expectation.to_string(),
            last.unwrap_or_default(),
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================
