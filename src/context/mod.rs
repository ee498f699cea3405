//! The automation seam the resolver drives.
//!
//! [`AutomationContext`] abstracts one controllable browsing context: element
//! lookup, attribute access, clicks, URL loading, page text, and recording
//! stubs on page-global functions. Two implementations ship with the crate:
//!
//! | Type | Backing |
//! |------|---------|
//! | [`Page`](crate::Page) | Firefox through the WebExtension bridge |
//! | [`MemoryContext`] | In-memory page model for tests and dry runs |
//!
//! Bounded waits are not part of the trait; they are built on top of it in
//! [`wait`](crate::wait) so every implementation gets the same timing.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::By;
use crate::error::Result;
use crate::identifiers::InterceptId;

// ============================================================================
// Submodules
// ============================================================================

/// In-memory automation context.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{ClickBehavior, MemoryContext, MemoryElement, MemoryHandle, MemoryPage};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for full page loads.
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// TestOptions
// ============================================================================

/// Per-test options applied when a context is prepared for a test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestOptions {
    /// Do not fail the test when the page throws uncaught errors.
    pub ignore_uncaught_exceptions: bool,
}

impl TestOptions {
    /// Options that tolerate page script errors.
    #[inline]
    #[must_use]
    pub fn ignoring_page_errors() -> Self {
        Self {
            ignore_uncaught_exceptions: true,
        }
    }
}

// ============================================================================
// LoadOptions
// ============================================================================

/// Options for loading a URL into the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Treat non-2xx/3xx main-document status codes as load failures.
    pub fail_on_status_code: bool,
    /// Maximum time to wait for the load.
    pub timeout: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            fail_on_status_code: true,
            timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
        }
    }
}

impl LoadOptions {
    /// Load options that accept any HTTP status.
    #[inline]
    #[must_use]
    pub fn tolerant(timeout: Duration) -> Self {
        Self {
            fail_on_status_code: false,
            timeout,
        }
    }

    /// Returns `true` if `status` must fail the load under these options.
    #[inline]
    #[must_use]
    pub fn rejects(&self, status: u16) -> bool {
        self.fail_on_status_code && !(200..400).contains(&status)
    }
}

// ============================================================================
// Interception
// ============================================================================

/// Handle to a recording stub installed on a page-global function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interception {
    id: InterceptId,
    object_path: String,
    method: String,
}

impl Interception {
    /// Creates an interception handle.
    #[must_use]
    pub fn new(id: InterceptId, object_path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id,
            object_path: object_path.into(),
            method: method.into(),
        }
    }

    /// Returns the interception ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &InterceptId {
        &self.id
    }

    /// Returns the object path the stub was installed on (e.g. `window`).
    #[inline]
    #[must_use]
    pub fn object_path(&self) -> &str {
        &self.object_path
    }

    /// Returns the stubbed method name (e.g. `open`).
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for Interception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object_path, self.method)
    }
}

// ============================================================================
// CallRecord
// ============================================================================

/// Arguments captured by an interception, one tuple per invocation, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallRecord {
    calls: Vec<Vec<Value>>,
}

impl CallRecord {
    /// Creates a record from captured argument tuples.
    #[inline]
    #[must_use]
    pub fn new(calls: Vec<Vec<Value>>) -> Self {
        Self { calls }
    }

    /// Returns `true` if the function was invoked at least once.
    #[inline]
    #[must_use]
    pub fn was_called(&self) -> bool {
        !self.calls.is_empty()
    }

    /// Number of recorded invocations.
    #[inline]
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// All recorded argument tuples.
    #[inline]
    #[must_use]
    pub fn calls(&self) -> &[Vec<Value>] {
        &self.calls
    }

    /// First argument of the first invocation, if it is a non-blank string.
    #[must_use]
    pub fn first_arg_str(&self) -> Option<&str> {
        self.calls
            .first()
            .and_then(|args| args.first())
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ============================================================================
// AutomationContext
// ============================================================================

/// A single controllable browsing context.
///
/// Every operation acts on whatever document is currently loaded. Element
/// handles are only valid for the document they were found in.
#[async_trait]
pub trait AutomationContext: Send + Sync {
    /// Element handle type.
    type Element: Clone + fmt::Debug + Send + Sync;

    /// Prepares the context for one test.
    async fn setup(&self, options: &TestOptions) -> Result<()>;

    /// Finds the first element matching `by`, or `None` if absent right now.
    async fn find_element(&self, by: &By) -> Result<Option<Self::Element>>;

    /// Returns `true` if the element is rendered.
    async fn is_visible(&self, element: &Self::Element) -> Result<bool>;

    /// Reads an attribute; `None` if the attribute is absent.
    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// Removes an attribute from the element.
    async fn remove_attribute(&self, element: &Self::Element, name: &str) -> Result<()>;

    /// Simulates a user click.
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Replaces `object_path.method` with a recording stub.
    ///
    /// The stub records arguments and does not call the original function.
    /// It lives as long as the current document.
    async fn intercept_call(&self, object_path: &str, method: &str) -> Result<Interception>;

    /// Reads the calls recorded so far.
    ///
    /// Returns an empty record once the intercepted document is gone.
    async fn call_record(&self, interception: &Interception) -> Result<CallRecord>;

    /// Loads a URL, relative URLs resolve against the current document.
    async fn load_url(&self, url: &str, options: &LoadOptions) -> Result<()>;

    /// Returns the URL of the current document.
    async fn current_url(&self) -> Result<String>;

    /// Returns the rendered text of the current document.
    async fn page_text(&self) -> Result<String>;

    /// Returns uncaught page errors collected since [`setup`](Self::setup).
    ///
    /// Always empty when the test ignores uncaught exceptions.
    async fn uncaught_errors(&self) -> Result<Vec<String>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_call_record_first_arg() {
        let record = CallRecord::new(vec![
            vec![json!("https://www.naukri.com/companies-hiring-in-india"), json!("_blank")],
            vec![json!("https://other.example/")],
        ]);
        assert!(record.was_called());
        assert_eq!(record.call_count(), 2);
        assert_eq!(
            record.first_arg_str(),
            Some("https://www.naukri.com/companies-hiring-in-india")
        );
    }

    #[test]
    fn test_call_record_blank_or_missing_arg() {
        assert_eq!(CallRecord::default().first_arg_str(), None);
        assert_eq!(CallRecord::new(vec![vec![]]).first_arg_str(), None);
        assert_eq!(CallRecord::new(vec![vec![json!("  ")]]).first_arg_str(), None);
        assert_eq!(CallRecord::new(vec![vec![json!(null)]]).first_arg_str(), None);
    }

    #[test]
    fn test_call_record_deserializes_from_nested_arrays() {
        let record: CallRecord = serde_json::from_value(json!([["/a"], []])).expect("parse");
        assert_eq!(record.call_count(), 2);
        assert_eq!(record.first_arg_str(), Some("/a"));
    }

    #[test]
    fn test_load_options_rejects() {
        let strict = LoadOptions::default();
        assert!(strict.rejects(404));
        assert!(strict.rejects(503));
        assert!(!strict.rejects(200));
        assert!(!strict.rejects(302));

        let tolerant = LoadOptions::tolerant(Duration::from_secs(1));
        assert!(!tolerant.rejects(503));
    }

    #[test]
    fn test_test_options_deserialize_camel_case() {
        let opts: TestOptions =
            serde_json::from_value(json!({"ignoreUncaughtExceptions": true})).expect("parse");
        assert!(opts.ignore_uncaught_exceptions);
        assert_eq!(
            serde_json::from_value::<TestOptions>(json!({})).expect("parse"),
            TestOptions::default()
        );
    }

    #[test]
    fn test_interception_display() {
        let interception = Interception::new(InterceptId::generate(), "window", "open");
        assert_eq!(interception.to_string(), "window.open");
    }
}
