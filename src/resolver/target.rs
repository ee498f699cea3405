//! The element a test is about to click.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;

use crate::browser::By;
use crate::context::AutomationContext;
use crate::error::{Error, Result};
use crate::wait::{Polled, Probe, Wait, poll};

// ============================================================================
// LocateOptions
// ============================================================================

/// How to wait for a click target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateOptions {
    /// Wait timing.
    pub wait: Wait,
    /// Also wait for the element to be rendered.
    pub require_visible: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            wait: Wait::default(),
            require_visible: true,
        }
    }
}

impl LocateOptions {
    /// Waits up to `timeout` for a visible element.
    #[inline]
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            wait: Wait::new(timeout),
            require_visible: true,
        }
    }

    /// Accepts elements that exist but are not rendered.
    #[inline]
    #[must_use]
    pub fn allow_hidden(mut self) -> Self {
        self.require_visible = false;
        self
    }
}

// ============================================================================
// ClickTarget
// ============================================================================

/// A located element plus the attributes resolution depends on, read before
/// anything is mutated.
#[derive(Debug, Clone)]
pub struct ClickTarget<E> {
    by: By,
    element: Option<E>,
    href: Option<String>,
    target: Option<String>,
    visible: bool,
}

impl<E: Clone> ClickTarget<E> {
    /// Waits for `by` to exist (and be visible, if required) and snapshots it.
    ///
    /// # Errors
    ///
    /// - [`Error::ElementNotFound`] if the wait expires
    /// - Context errors while probing
    pub async fn locate<C>(ctx: &C, by: By, options: &LocateOptions) -> Result<Self>
    where
        C: AutomationContext<Element = E> + ?Sized,
    {
        let by_ref = &by;
        let require_visible = options.require_visible;

        let polled = poll(options.wait, || async move {
            let Some(element) = ctx.find_element(by_ref).await? else {
                return Ok(Probe::Pending(Some("absent".to_string())));
            };
            if require_visible && !ctx.is_visible(&element).await? {
                return Ok(Probe::Pending(Some("hidden".to_string())));
            }
            Ok(Probe::Ready(element))
        })
        .await?;

        match polled {
            Polled::Ready(element) => Self::snapshot(ctx, by, element).await,
            Polled::Expired { last } => {
                debug!(%by, state = ?last, "Click target not found");
                Err(Error::element_not_found(
                    by.to_string(),
                    options.wait.timeout_ms(),
                ))
            }
        }
    }

    /// Builds a target from an element already in hand.
    ///
    /// # Errors
    ///
    /// Context errors while reading attributes.
    pub async fn snapshot<C>(ctx: &C, by: By, element: E) -> Result<Self>
    where
        C: AutomationContext<Element = E> + ?Sized,
    {
        let href = ctx.attribute(&element, "href").await?;
        let target = ctx.attribute(&element, "target").await?;
        let visible = ctx.is_visible(&element).await?;

        Ok(Self {
            by,
            element: Some(element),
            href,
            target,
            visible,
        })
    }

    /// A target whose element does not exist.
    #[must_use]
    pub fn missing(by: By) -> Self {
        Self {
            by,
            element: None,
            href: None,
            target: None,
            visible: false,
        }
    }
}

impl<E> ClickTarget<E> {
    /// Locator the target was found by.
    #[inline]
    #[must_use]
    pub fn by(&self) -> &By {
        &self.by
    }

    /// Element handle, if the element exists.
    #[inline]
    #[must_use]
    pub fn element(&self) -> Option<&E> {
        self.element.as_ref()
    }

    /// Returns `true` if the element exists.
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.element.is_some()
    }

    /// Returns `true` if the element was rendered when snapshotted.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Raw `href` attribute.
    #[inline]
    #[must_use]
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    /// Non-blank `href`, trimmed.
    #[must_use]
    pub fn usable_href(&self) -> Option<&str> {
        self.href
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    /// Raw `target` attribute.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context::{LoadOptions, MemoryContext, MemoryElement, MemoryHandle, MemoryPage};

    const HOME: &str = "https://www.naukri.com/";

    async fn home(element: MemoryElement) -> MemoryContext {
        let ctx = MemoryContext::new().with_page(MemoryPage::new(HOME).element(element));
        ctx.load_url(HOME, &LoadOptions::default())
            .await
            .expect("load");
        ctx
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_snapshots_attributes() {
        let ctx = home(
            MemoryElement::new(By::id("register_Layer"))
                .href(" /registration/createAccount ")
                .target("_blank"),
        )
        .await;

        let target = ClickTarget::locate(&ctx, By::id("register_Layer"), &LocateOptions::default())
            .await
            .expect("located");

        assert!(target.exists());
        assert!(target.is_visible());
        assert_eq!(target.usable_href(), Some("/registration/createAccount"));
        assert_eq!(target.target(), Some("_blank"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_waits_for_late_element() {
        let ctx = home(MemoryElement::new(By::id("late")).appears_after(5)).await;
        let target = ClickTarget::locate(&ctx, By::id("late"), &LocateOptions::default())
            .await
            .expect("located");
        assert!(target.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_times_out() {
        let ctx = home(MemoryElement::new(By::id("other"))).await;
        let err = ClickTarget::<MemoryHandle>::locate(
            &ctx,
            By::id("register_Layer"),
            &LocateOptions::new(Duration::from_millis(500)),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            Error::ElementNotFound { ref selector, timeout_ms: 500 } if selector == "id:register_Layer"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_survives_rerender() {
        let ctx = home(MemoryElement::new(By::id("register_Layer")).rerenders(2)).await;

        let target = ClickTarget::locate(
            &ctx,
            By::id("register_Layer"),
            &LocateOptions::new(Duration::from_secs(30)),
        )
        .await
        .expect("located after re-render");

        assert!(target.exists());
        assert!(target.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_rerendering_past_deadline_is_not_found() {
        let ctx = home(MemoryElement::new(By::id("register_Layer")).rerenders(u32::MAX)).await;

        let err = ClickTarget::<MemoryHandle>::locate(
            &ctx,
            By::id("register_Layer"),
            &LocateOptions::new(Duration::from_millis(300)),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::ElementNotFound { timeout_ms: 300, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_element_requires_allow_hidden() {
        let ctx = home(MemoryElement::new(By::id("menu")).hidden()).await;

        let err = ClickTarget::<MemoryHandle>::locate(
            &ctx,
            By::id("menu"),
            &LocateOptions::new(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();
        assert!(err.is_element_error());

        let target = ClickTarget::locate(
            &ctx,
            By::id("menu"),
            &LocateOptions::new(Duration::from_millis(200)).allow_hidden(),
        )
        .await
        .expect("located");
        assert!(!target.is_visible());
    }

    #[test]
    fn test_missing_target() {
        let target = ClickTarget::<MemoryHandle>::missing(By::id("gone"));
        assert!(!target.exists());
        assert_eq!(target.usable_href(), None);
    }

    #[test]
    fn test_blank_href_is_unusable() {
        let mut target = ClickTarget::<MemoryHandle>::missing(By::id("x"));
        target.href = Some("   ".into());
        assert_eq!(target.href(), Some("   "));
        assert_eq!(target.usable_href(), None);
    }
}
