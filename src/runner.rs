//! Navigation test cases.
//!
//! A [`NavigationCase`] describes one "click this, end up there" check:
//! load a start page, find the element, resolve the click, then assert on
//! the URL and/or page content. [`CaseRunner`] executes cases against a
//! context with the retry budget of a [`RunConfig`].

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::assertion::{TextExpectation, UrlExpectation, expect_text, expect_url};
use crate::browser::By;
use crate::config::{RunConfig, RunMode};
use crate::context::{AutomationContext, LoadOptions, TestOptions};
use crate::error::{Error, Result};
use crate::resolver::{
    ClickTarget, LocateOptions, NavigationOutcome, NavigationResolver, ResolverOptions,
};
use crate::wait::Wait;

// ============================================================================
// NavigationCase
// ============================================================================

/// One navigation check.
#[derive(Debug, Clone)]
pub struct NavigationCase {
    name: String,
    start_url: String,
    target: By,
    require_visible: bool,
    base_url: Option<String>,
    expect_url: Option<UrlExpectation>,
    expect_text: Option<TextExpectation>,
    return_to_start: bool,
    options: TestOptions,
}

impl NavigationCase {
    /// Creates a case that loads `start_url` and clicks `target`.
    #[must_use]
    pub fn new(name: impl Into<String>, start_url: impl Into<String>, target: By) -> Self {
        Self {
            name: name.into(),
            start_url: start_url.into(),
            target,
            require_visible: true,
            base_url: None,
            expect_url: None,
            expect_text: None,
            return_to_start: false,
            options: TestOptions::default(),
        }
    }

    /// Asserts on the URL after a resolved navigation.
    #[inline]
    #[must_use]
    pub fn expect_url(mut self, expectation: UrlExpectation) -> Self {
        self.expect_url = Some(expectation);
        self
    }

    /// Asserts on the page text after the click.
    ///
    /// This is also the fallback check when the click cannot be resolved.
    #[inline]
    #[must_use]
    pub fn expect_text(mut self, expectation: TextExpectation) -> Self {
        self.expect_text = Some(expectation);
        self
    }

    /// Joins relative `href` values against `base` instead of the start page.
    #[inline]
    #[must_use]
    pub fn base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    /// Loads the start page again at the end and checks the URL is back.
    #[inline]
    #[must_use]
    pub fn return_to_start(mut self) -> Self {
        self.return_to_start = true;
        self
    }

    /// Accepts a target that exists but is not rendered.
    #[inline]
    #[must_use]
    pub fn allow_hidden(mut self) -> Self {
        self.require_visible = false;
        self
    }

    /// Does not fail on uncaught page errors.
    #[inline]
    #[must_use]
    pub fn ignore_uncaught_exceptions(mut self) -> Self {
        self.options.ignore_uncaught_exceptions = true;
        self
    }

    /// Case name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start page.
    #[inline]
    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// Click target locator.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &By {
        &self.target
    }
}

// ============================================================================
// CaseReport
// ============================================================================

/// Result of a passing case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    /// Case name.
    pub name: String,
    /// Attempts used, including the passing one.
    pub attempts: u32,
    /// Resolution outcome of the passing attempt.
    pub outcome: NavigationOutcome,
}

// ============================================================================
// CaseRunner
// ============================================================================

/// Runs [`NavigationCase`]s against one context.
pub struct CaseRunner<'a, C: ?Sized> {
    ctx: &'a C,
    config: RunConfig,
    mode: RunMode,
}

impl<'a, C> CaseRunner<'a, C>
where
    C: AutomationContext + ?Sized,
{
    /// Creates a runner with the default configuration in [`RunMode::Run`].
    #[must_use]
    pub fn new(ctx: &'a C) -> Self {
        Self {
            ctx,
            config: RunConfig::default(),
            mode: RunMode::Run,
        }
    }

    /// Sets the run configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the run mode.
    #[inline]
    #[must_use]
    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Runs a case, retrying recoverable failures up to the configured
    /// budget.
    ///
    /// # Errors
    ///
    /// The error of the last attempt, or the first non-recoverable error.
    pub async fn run(&self, case: &NavigationCase) -> Result<CaseReport> {
        let attempts = self.config.attempts(self.mode);

        for attempt in 1..=attempts {
            match self.run_once(case).await {
                Ok(outcome) => {
                    info!(
                        case = %case.name,
                        attempt,
                        method = %outcome.method,
                        "Case passed"
                    );
                    return Ok(CaseReport {
                        name: case.name.clone(),
                        attempts: attempt,
                        outcome,
                    });
                }
                Err(e) if attempt < attempts && e.is_recoverable() => {
                    warn!(case = %case.name, attempt, error = %e, "Attempt failed, retrying");
                }
                Err(e) => {
                    warn!(case = %case.name, attempt, error = %e, "Case failed");
                    return Err(e);
                }
            }
        }

        Err(Error::config("retry budget allows no attempts"))
    }

    /// Runs every case in order and collects the results.
    pub async fn run_all(&self, cases: &[NavigationCase]) -> Vec<(String, Result<CaseReport>)> {
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            results.push((case.name.clone(), self.run(case).await));
        }
        results
    }

    async fn run_once(&self, case: &NavigationCase) -> Result<NavigationOutcome> {
        let ctx = self.ctx;
        let wait = Wait::new(self.config.default_command_timeout);
        let load = LoadOptions::tolerant(self.config.page_load_timeout);

        ctx.setup(&case.options).await?;
        ctx.load_url(&case.start_url, &load).await?;

        let locate = LocateOptions {
            wait,
            require_visible: case.require_visible,
        };
        let target = ClickTarget::locate(ctx, case.target.clone(), &locate).await?;

        let resolver = NavigationResolver::with_options(ResolverOptions {
            base_url: case.base_url.as_deref().map(Url::parse).transpose()?,
            load,
            ..ResolverOptions::default()
        });
        let outcome = resolver.resolve(&target, ctx).await?;

        match (&case.expect_url, outcome.is_resolved()) {
            (Some(expectation), true) => {
                expect_url(ctx, expectation, wait).await?;
            }
            (_, false) if case.expect_text.is_none() => {
                return Err(Error::unresolved(&outcome.selector));
            }
            _ => {}
        }

        if let Some(expectation) = &case.expect_text {
            expect_text(ctx, expectation, wait).await?;
        }

        if case.return_to_start {
            ctx.load_url(&case.start_url, &load).await?;
            expect_url(ctx, &UrlExpectation::equals(case.start_url.clone()), wait).await?;
        }

        if !case.options.ignore_uncaught_exceptions {
            let messages = ctx.uncaught_errors().await?;
            if !messages.is_empty() {
                return Err(Error::UncaughtPageError { messages });
            }
        }

        Ok(outcome)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context::{MemoryContext, MemoryElement, MemoryPage};

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_without_text_fails() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new("https://www.naukri.com/")
                .element(MemoryElement::new(By::css(".dead"))),
        );
        let case = NavigationCase::new("dead", "https://www.naukri.com/", By::css(".dead"));

        let err = CaseRunner::new(&ctx)
            .config(RunConfig::default().with_retries(crate::config::Retries {
                run_mode: 0,
                open_mode: 0,
            }))
            .run(&case)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Unresolved { .. }));
    }

    #[test]
    fn test_case_builder() {
        let case = NavigationCase::new("c", "https://www.naukri.com/", By::id("x"))
            .allow_hidden()
            .return_to_start()
            .ignore_uncaught_exceptions();
        assert_eq!(case.name(), "c");
        assert_eq!(case.start_url(), "https://www.naukri.com/");
        assert_eq!(case.target(), &By::id("x"));
        assert!(!case.require_visible);
        assert!(case.return_to_start);
        assert!(case.options.ignore_uncaught_exceptions);
    }
}
