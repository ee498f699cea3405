//! Resolution outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// NavigationMethod
// ============================================================================

/// Which branch of the resolution chain produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationMethod {
    /// A click handler called `window.open` with a URL.
    ScriptedOpen,
    /// The element's `href`, joined against the base URL.
    HrefFallback,
    /// The context's URL changed after the click.
    DirectNavigation,
    /// None of the above.
    Unresolved,
}

impl NavigationMethod {
    /// Kebab-case name, as used in logs and reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScriptedOpen => "scripted-open",
            Self::HrefFallback => "href-fallback",
            Self::DirectNavigation => "direct-navigation",
            Self::Unresolved => "unresolved",
        }
    }

    /// Returns `true` if this branch loads the resolved URL into the context.
    #[inline]
    #[must_use]
    pub fn loads_url(&self) -> bool {
        matches!(self, Self::ScriptedOpen | Self::HrefFallback)
    }
}

impl fmt::Display for NavigationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NavigationOutcome
// ============================================================================

/// Result of resolving one click.
///
/// `resolved_url` is present exactly when `method` is not
/// [`NavigationMethod::Unresolved`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationOutcome {
    /// Locator of the clicked element.
    pub selector: String,
    /// Absolute destination URL.
    pub resolved_url: Option<String>,
    /// Branch that produced the destination.
    pub method: NavigationMethod,
    /// Context URL recorded before the click.
    pub url_before_click: String,
    /// Whether a `target` attribute was stripped before the click.
    pub target_removed: bool,
}

impl NavigationOutcome {
    /// Returns `true` unless the outcome is unresolved.
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.method != NavigationMethod::Unresolved
    }

    /// Returns the resolved URL, or [`Error::Unresolved`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unresolved`] for unresolved outcomes.
    pub fn require_url(&self) -> Result<&str> {
        self.resolved_url
            .as_deref()
            .ok_or_else(|| Error::unresolved(&self.selector))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(method: NavigationMethod, url: Option<&str>) -> NavigationOutcome {
        NavigationOutcome {
            selector: "id:register_Layer".into(),
            resolved_url: url.map(String::from),
            method,
            url_before_click: "https://www.naukri.com/".into(),
            target_removed: true,
        }
    }

    #[test]
    fn test_method_serializes_kebab_case() {
        let value = serde_json::to_value(NavigationMethod::DirectNavigation).expect("serialize");
        assert_eq!(value, "direct-navigation");
        assert_eq!(NavigationMethod::ScriptedOpen.to_string(), "scripted-open");
    }

    #[test]
    fn test_loads_url() {
        assert!(NavigationMethod::ScriptedOpen.loads_url());
        assert!(NavigationMethod::HrefFallback.loads_url());
        assert!(!NavigationMethod::DirectNavigation.loads_url());
        assert!(!NavigationMethod::Unresolved.loads_url());
    }

    #[test]
    fn test_require_url() {
        let resolved = outcome(
            NavigationMethod::HrefFallback,
            Some("https://www.naukri.com/registration/createAccount"),
        );
        assert!(resolved.is_resolved());
        assert_eq!(
            resolved.require_url().expect("resolved"),
            "https://www.naukri.com/registration/createAccount"
        );

        let unresolved = outcome(NavigationMethod::Unresolved, None);
        assert!(!unresolved.is_resolved());
        assert!(matches!(
            unresolved.require_url(),
            Err(Error::Unresolved { ref selector }) if selector == "id:register_Layer"
        ));
    }

    #[test]
    fn test_outcome_json_shape() {
        let value = serde_json::to_value(outcome(NavigationMethod::Unresolved, None))
            .expect("serialize");
        assert_eq!(value["method"], "unresolved");
        assert_eq!(value["urlBeforeClick"], "https://www.naukri.com/");
        assert!(value["resolvedUrl"].is_null());
        assert_eq!(value["targetRemoved"], true);
    }
}
