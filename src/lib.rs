//! nav-resolver - Follow link clicks inside a single browser context.
//!
//! E2E tests drive one browsing context, but links on real sites often open
//! their destination somewhere else: a click handler calls `window.open`, or
//! an anchor carries `target="_blank"`. This crate works out where a click
//! leads and brings that URL into the context under test, so assertions can
//! run against the destination.
//!
//! # Architecture
//!
//! - [`NavigationResolver`] runs the resolution chain against any
//!   [`AutomationContext`]
//! - [`Page`] implements the context on Firefox, through a WebExtension
//!   bridge that talks `module.methodName` commands over a local WebSocket
//! - [`MemoryContext`] implements it on an in-memory page model for tests
//! - [`CaseRunner`] wraps resolution with the load, assert and retry steps
//!   of a test case
//!
//! # Quick Start
//!
//! ```no_run
//! use nav_resolver::{
//!     By, CaseRunner, Driver, NavigationCase, Result, TextExpectation, UrlExpectation,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let driver = Driver::builder()
//!         .binary("/path/to/firefox")
//!         .extension("/path/to/extension")
//!         .build()?;
//!
//!     let window = driver.window().headless().spawn().await?;
//!     let page = window.page();
//!
//!     let case = NavigationCase::new(
//!         "register layer",
//!         "https://www.naukri.com/",
//!         By::id("register_Layer"),
//!     )
//!     .expect_url(UrlExpectation::contains("registration"))
//!     .expect_text(TextExpectation::contains_ignore_case("register"));
//!
//!     let report = CaseRunner::new(&page).run(&case).await?;
//!     println!("{} via {}", report.name, report.outcome.method);
//!
//!     window.close().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`resolver`] | Resolution chain and outcomes |
//! | [`context`] | [`AutomationContext`] seam and the in-memory context |
//! | [`runner`] | Test cases, retries |
//! | [`assertion`] | URL and content expectations |
//! | [`wait`] | Bounded polling |
//! | [`config`] | Run configuration |
//! | [`browser`] | Firefox entities: [`Window`], [`Page`], [`Element`] |
//! | [`driver`] | Firefox launching |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Bridge message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// URL and content expectations with bounded retries.
pub mod assertion;

/// Firefox entities: Window, Page, Element.
pub mod browser;

/// Run configuration: timeouts and retry budgets.
pub mod config;

/// The automation seam and its in-memory implementation.
pub mod context;

/// Firefox launching and profile preparation.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Bridge protocol message types.
pub mod protocol;

/// Click-to-destination resolution.
pub mod resolver;

/// Navigation test cases.
pub mod runner;

/// WebSocket transport layer.
pub mod transport;

/// Bounded polling.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Resolution
pub use resolver::{
    ClickTarget, LocateOptions, NavigationMethod, NavigationOutcome, NavigationResolver,
    ResolverOptions,
};

// Context
pub use context::{
    AutomationContext, CallRecord, Interception, LoadOptions, MemoryContext, MemoryElement,
    MemoryPage, TestOptions,
};

// Cases and assertions
pub use assertion::{TextExpectation, UrlExpectation};
pub use config::{Retries, RunConfig, RunMode};
pub use runner::{CaseReport, CaseRunner, NavigationCase};
pub use wait::Wait;

// Browser types
pub use browser::{By, Element, LoadStatus, Page, Window, WindowBuilder};

// Driver types
pub use driver::{BrowserOptions, Driver, DriverBuilder, ExtensionSource, Profile};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ElementId, FrameId, InterceptId, RequestId, SessionId, TabId};
