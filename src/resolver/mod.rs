//! Click-to-destination resolution.
//!
//! Links on real sites reach their destination in different ways: a click
//! handler may call `window.open`, the anchor may carry a plain `href` with
//! `target="_blank"`, or a client-side router may change the URL in place.
//! A single browsing context can follow none of the new-window cases, so
//! [`NavigationResolver`] works out the destination and brings it into the
//! context under test.
//!
//! # Resolution Chain
//!
//! Before the click, the resolver records the current URL, stubs
//! `window.open` with a recorder, and strips any `target` attribute. After
//! the click, the first matching branch wins:
//!
//! | Order | Branch | Destination | Context action |
//! |-------|--------|-------------|----------------|
//! | 1 | [`ScriptedOpen`](NavigationMethod::ScriptedOpen) | First argument of the first `window.open` call | Load it |
//! | 2 | [`HrefFallback`](NavigationMethod::HrefFallback) | `href` joined against the base URL | Load it |
//! | 3 | [`DirectNavigation`](NavigationMethod::DirectNavigation) | Context URL, once it differs from the pre-click URL | None |
//! | 4 | [`Unresolved`](NavigationMethod::Unresolved) | None | None |
//!
//! Loads tolerate any HTTP status; only network-level failures surface as
//! [`Error::LoadFailure`].

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::context::{AutomationContext, CallRecord, DEFAULT_PAGE_LOAD_TIMEOUT, LoadOptions};
use crate::error::{Error, Result};
use crate::wait::{DEFAULT_POLL_INTERVAL, Polled, Probe, Wait, poll};

// ============================================================================
// Submodules
// ============================================================================

/// Resolution outcome types.
pub mod outcome;

/// Click targets and how to locate them.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use outcome::{NavigationMethod, NavigationOutcome};
pub use target::{ClickTarget, LocateOptions};

// ============================================================================
// Constants
// ============================================================================

/// Object path of the intercepted function.
pub const WINDOW_OPEN_OBJECT: &str = "window";

/// Name of the intercepted function.
pub const WINDOW_OPEN_METHOD: &str = "open";

/// Default time to wait for an in-place URL change after the click.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// ResolverOptions
// ============================================================================

/// Tuning for [`NavigationResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Base for relative `href` values; defaults to the pre-click URL.
    pub base_url: Option<Url>,
    /// How long to watch for a direct navigation before giving up.
    pub settle: Wait,
    /// Options for loading the resolved URL.
    pub load: LoadOptions,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            settle: Wait::new(DEFAULT_SETTLE_TIMEOUT).interval(DEFAULT_POLL_INTERVAL),
            load: LoadOptions::tolerant(DEFAULT_PAGE_LOAD_TIMEOUT),
        }
    }
}

// ============================================================================
// NavigationResolver
// ============================================================================

/// Resolves where a click leads and loads it into the context.
///
/// The resolver holds no per-click state; one instance can be reused.
///
/// # Example
///
/// ```ignore
/// let target = ClickTarget::locate(&page, By::id("register_Layer"), &LocateOptions::default()).await?;
/// let outcome = NavigationResolver::new().resolve(&target, &page).await?;
/// assert_eq!(outcome.method, NavigationMethod::HrefFallback);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NavigationResolver {
    options: ResolverOptions,
}

impl NavigationResolver {
    /// Creates a resolver with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with custom options.
    #[inline]
    #[must_use]
    pub fn with_options(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// Sets the base URL for relative `href` values.
    #[inline]
    #[must_use]
    pub fn base_url(mut self, base: Url) -> Self {
        self.options.base_url = Some(base);
        self
    }

    /// Sets the direct-navigation settle window.
    #[inline]
    #[must_use]
    pub fn settle(mut self, timeout: Duration) -> Self {
        self.options.settle.timeout = timeout;
        self
    }

    /// Sets the load timeout for resolved URLs.
    #[inline]
    #[must_use]
    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.options.load.timeout = timeout;
        self
    }

    /// Returns the options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Clicks `target` and resolves where the click leads.
    ///
    /// For [`ScriptedOpen`](NavigationMethod::ScriptedOpen) and
    /// [`HrefFallback`](NavigationMethod::HrefFallback) the resolved URL is
    /// loaded into `ctx` before returning.
    ///
    /// # Errors
    ///
    /// - [`Error::ElementNotFound`] if the target does not exist
    /// - [`Error::LoadFailure`] if the resolved URL cannot be loaded
    /// - [`Error::InvalidUrl`] if a URL cannot be joined against its base
    /// - Context errors from the click sequence
    pub async fn resolve<C>(
        &self,
        target: &ClickTarget<C::Element>,
        ctx: &C,
    ) -> Result<NavigationOutcome>
    where
        C: AutomationContext + ?Sized,
    {
        let selector = target.by().to_string();
        let Some(element) = target.element() else {
            return Err(Error::element_not_found(selector, 0));
        };

        let url_before_click = ctx.current_url().await?;
        let interception = ctx
            .intercept_call(WINDOW_OPEN_OBJECT, WINDOW_OPEN_METHOD)
            .await?;

        let target_removed = target.target().is_some();
        if target_removed {
            ctx.remove_attribute(element, "target").await?;
        }

        debug!(%selector, url = %url_before_click, target_removed, "Clicking");
        ctx.click(element).await?;

        let record = ctx.call_record(&interception).await?;
        let outcome = |method, resolved_url: Option<String>| NavigationOutcome {
            selector: selector.clone(),
            resolved_url,
            method,
            url_before_click: url_before_click.clone(),
            target_removed,
        };

        let outcome = if let Some(url) = scripted_open_url(&record, &url_before_click)? {
            outcome(NavigationMethod::ScriptedOpen, Some(url.to_string()))
        } else if let Some(href) = target.usable_href() {
            let url = self.join_href(href, &url_before_click)?;
            outcome(NavigationMethod::HrefFallback, Some(url.to_string()))
        } else {
            let before = url_before_click.as_str();
            let changed = poll(self.options.settle, || async move {
                let now = ctx.current_url().await?;
                if now == before {
                    Ok(Probe::Pending(None))
                } else {
                    Ok(Probe::Ready(now))
                }
            })
            .await?;

            match changed {
                Polled::Ready(url) => outcome(NavigationMethod::DirectNavigation, Some(url)),
                Polled::Expired { .. } => outcome(NavigationMethod::Unresolved, None),
            }
        };

        if outcome.method.loads_url() {
            self.follow(ctx, &outcome).await?;
        }

        match &outcome.resolved_url {
            Some(url) => info!(%selector, method = %outcome.method, %url, "Navigation resolved"),
            None => warn!(%selector, "Click produced no observable navigation"),
        }
        Ok(outcome)
    }

    /// Joins `href` against the configured base or the pre-click URL.
    fn join_href(&self, href: &str, url_before_click: &str) -> Result<Url> {
        let base = match &self.options.base_url {
            Some(base) => base.clone(),
            None => Url::parse(url_before_click)?,
        };
        Ok(base.join(href)?)
    }

    /// Loads the resolved URL of a loading branch.
    async fn follow<C>(&self, ctx: &C, outcome: &NavigationOutcome) -> Result<()>
    where
        C: AutomationContext + ?Sized,
    {
        let url = outcome.require_url()?;
        debug!(selector = %outcome.selector, %url, "Loading resolved URL");
        ctx.load_url(url, &self.options.load).await
    }
}

/// Destination of the first recorded `window.open` call, if any.
///
/// Relative URLs resolve against the document that made the call.
fn scripted_open_url(record: &CallRecord, url_before_click: &str) -> Result<Option<Url>> {
    let Some(raw) = record.first_arg_str() else {
        if record.was_called() {
            debug!(calls = record.call_count(), "window.open called without a URL");
        }
        return Ok(None);
    };

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(url_before_click)?.join(raw)?,
        Err(e) => return Err(e.into()),
    };
    Ok(Some(url))
}

// ============================================================================
// Tests
// ============================================================================
