//! Error types for navigation resolution and the Firefox bridge.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use nav_resolver::{Result, Error};
//!
//! async fn example(page: &Page) -> Result<()> {
//!     let outcome = NavigationResolver::new().resolve(&target, page).await?;
//!     let url = outcome.require_url()?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Profile`], [`Error::BrowserNotFound`], [`Error::ProcessLaunchFailed`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::InvalidArgument`], [`Error::Protocol`] |
//! | Element | [`Error::ElementNotFound`], [`Error::StaleElement`] |
//! | Navigation | [`Error::Unresolved`], [`Error::LoadFailure`], [`Error::InvalidUrl`] |
//! | Verification | [`Error::AssertionFailure`], [`Error::UncaughtPageError`] |
//! | Execution | [`Error::ScriptError`], [`Error::Timeout`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Regex`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{ElementId, RequestId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Profile error.
    ///
    /// Returned when the browser profile cannot be created or populated.
    #[error("Profile error: {message}")]
    Profile {
        /// Description of the profile error.
        message: String,
    },

    /// Browser binary not found at path.
    #[error("Browser not found at: {path}")]
    BrowserNotFound {
        /// Path where the binary was expected.
        path: PathBuf,
    },

    /// Failed to launch the browser process.
    #[error("Failed to launch browser: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Extension did not connect in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Protocol violation or error response from the extension.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Element Errors
    // ========================================================================
    /// Element did not exist (or become visible) within the timeout.
    #[error("Element not found: selector={selector} after {timeout_ms}ms")]
    ElementNotFound {
        /// Locator used, as `strategy:value`.
        selector: String,
        /// Milliseconds waited.
        timeout_ms: u64,
    },

    /// Element reference is no longer attached to the document.
    #[error("Stale element: {element_id}")]
    StaleElement {
        /// The stale element's ID.
        element_id: ElementId,
    },

    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// A URL was required but no resolution branch applied.
    ///
    /// Callers that can fall back to a content assertion should inspect
    /// [`NavigationMethod::Unresolved`](crate::NavigationMethod::Unresolved)
    /// instead of raising this.
    #[error("Navigation unresolved for {selector}: no window.open call, no href, URL unchanged")]
    Unresolved {
        /// Locator of the clicked element.
        selector: String,
    },

    /// Loading a resolved URL failed.
    #[error("Failed to load {url}: {message}")]
    LoadFailure {
        /// URL that was being loaded.
        url: String,
        /// HTTP status, when the failure is a rejected status code.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// A string could not be parsed or joined as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ========================================================================
    // Verification Errors
    // ========================================================================
    /// URL or content expectation not met.
    #[error("Assertion failed: {assertion}: expected {expected}, actual {actual}")]
    AssertionFailure {
        /// What was being asserted.
        assertion: String,
        /// Expected value.
        expected: String,
        /// Last observed value.
        actual: String,
    },

    /// The page raised uncaught errors and the test does not ignore them.
    #[error("Uncaught page error: {}", messages.join("; "))]
    UncaughtPageError {
        /// Collected error messages, oldest first.
        messages: Vec<String>,
    },

    // ========================================================================
    // Execution Errors
    // ========================================================================
    /// JavaScript execution error.
    #[error("Script error: {message}")]
    ScriptError {
        /// Error message from script execution.
        message: String,
    },

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Invalid regular expression in an expectation.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a profile error.
    #[inline]
    pub fn profile(message: impl Into<String>) -> Self {
        Self::Profile {
            message: message.into(),
        }
    }

    /// Creates a browser not found error.
    #[inline]
    pub fn browser_not_found(path: impl Into<PathBuf>) -> Self {
        Self::BrowserNotFound { path: path.into() }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an element not found error.
    #[inline]
    pub fn element_not_found(selector: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ElementNotFound {
            selector: selector.into(),
            timeout_ms,
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(element_id: ElementId) -> Self {
        Self::StaleElement { element_id }
    }

    /// Creates an unresolved navigation error.
    #[inline]
    pub fn unresolved(selector: impl Into<String>) -> Self {
        Self::Unresolved {
            selector: selector.into(),
        }
    }

    /// Creates a load failure for a network-level error.
    #[inline]
    pub fn load_failure(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailure {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Creates a load failure for a rejected HTTP status.
    #[inline]
    pub fn load_status(url: impl Into<String>, status: u16) -> Self {
        Self::LoadFailure {
            url: url.into(),
            status: Some(status),
            message: format!("status code {status}"),
        }
    }

    /// Creates an assertion failure.
    #[inline]
    pub fn assertion(
        assertion: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::AssertionFailure {
            assertion: assertion.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::Timeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is an element error.
    #[inline]
    #[must_use]
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::StaleElement { .. }
        )
    }

    /// Returns `true` if a repeated probe may succeed, e.g. while the page
    /// re-renders the node or replaces the document.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StaleElement { .. } | Self::ScriptError { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error may go away when the whole case is re-run.
    ///
    /// Third-party pages are slow and flaky, so element, load and assertion
    /// failures all qualify. Configuration and bridge failures do not.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. }
                | Self::Timeout { .. }
                | Self::RequestTimeout { .. }
                | Self::StaleElement { .. }
                | Self::ElementNotFound { .. }
                | Self::LoadFailure { .. }
                | Self::AssertionFailure { .. }
                | Self::Unresolved { .. }
                | Self::UncaughtPageError { .. }
                | Self::ScriptError { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_assertion_display_names_expected_and_actual() {
        let err = Error::assertion(
            "url contains",
            "/registration/createAccount",
            "https://www.naukri.com/",
        );
        let msg = err.to_string();
        assert!(msg.contains("/registration/createAccount"));
        assert!(msg.contains("https://www.naukri.com/"));
    }

    #[test]
    fn test_load_status_carries_status() {
        let err = Error::load_status("https://example.com/", 503);
        assert!(matches!(
            err,
            Error::LoadFailure {
                status: Some(503),
                ..
            }
        ));
    }

    #[test]
    fn test_uncaught_page_error_joins_messages() {
        let err = Error::UncaughtPageError {
            messages: vec!["a is undefined".into(), "b failed".into()],
        };
        assert_eq!(err.to_string(), "Uncaught page error: a is undefined; b failed");
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::ConnectionTimeout { timeout_ms: 5000 };
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_element_error() {
        assert!(Error::element_not_found("css:#register_Layer", 30_000).is_element_error());
        assert!(!Error::config("x").is_element_error());
        assert!(Error::stale_element(ElementId::new("el-1")).is_transient());
        assert!(Error::script_error("document replaced").is_transient());
        assert!(!Error::ConnectionClosed.is_transient());
        assert!(!Error::element_not_found("css:#x", 0).is_transient());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::timeout("wait", 1000).is_recoverable());
        assert!(Error::unresolved("css:#x").is_recoverable());
        assert!(!Error::config("test").is_recoverable());
        assert!(!Error::ConnectionClosed.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_url_error() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
