//! In-memory automation context.
//!
//! [`MemoryContext`] models a single browsing context over a fixed set of
//! pages. It follows the same document lifecycle as a browser tab: loading
//! a URL replaces the document, element handles and installed stubs die with
//! their document, anchors with a `target` attribute open a new window the
//! context never sees, and a real (unstubbed) `window.open` does the same.
//!
//! Elements are located by exact locator equality; the model does not
//! evaluate CSS or XPath.
//!
//! ```ignore
//! let ctx = MemoryContext::new()
//!     .with_page(
//!         MemoryPage::new("https://www.naukri.com/").element(
//!             MemoryElement::new(By::id("register_Layer"))
//!                 .href("/registration/createAccount")
//!                 .target("_blank"),
//!         ),
//!     )
//!     .with_page(MemoryPage::new("https://www.naukri.com/registration/createAccount"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::browser::By;
use crate::error::{Error, Result};
use crate::identifiers::{ElementId, InterceptId};

use super::{AutomationContext, CallRecord, Interception, LoadOptions, TestOptions};

// ============================================================================
// Constants
// ============================================================================

/// Status returned for URLs without a registered page.
const MISSING_PAGE_STATUS: u16 = 404;

/// URL of the initial document.
const BLANK_URL: &str = "about:blank";

// ============================================================================
// ClickBehavior
// ============================================================================

/// What clicking a [`MemoryElement`] does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickBehavior {
    /// Browser default: anchors follow `href`, other elements do nothing.
    Default,
    /// A click handler calls `window.open(url, "_blank")` and cancels the
    /// default action.
    ScriptedOpen(String),
    /// A click handler assigns `location`, loading a new document.
    Navigate(String),
    /// A client-side router pushes a history entry; the document survives.
    PushState(String),
    /// A click handler throws; the default action still runs.
    Throw(String),
}

// ============================================================================
// MemoryElement
// ============================================================================

/// Element definition on a [`MemoryPage`].
#[derive(Debug, Clone)]
pub struct MemoryElement {
    by: By,
    attributes: FxHashMap<String, String>,
    visible: bool,
    on_click: ClickBehavior,
    appears_after: u32,
    stale_checks: u32,
}

impl MemoryElement {
    /// Creates a visible element found by `by`.
    #[must_use]
    pub fn new(by: By) -> Self {
        Self {
            by,
            attributes: FxHashMap::default(),
            visible: true,
            on_click: ClickBehavior::Default,
            appears_after: 0,
            stale_checks: 0,
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the `href` attribute.
    #[inline]
    #[must_use]
    pub fn href(self, href: impl Into<String>) -> Self {
        self.attr("href", href)
    }

    /// Sets the `target` attribute.
    #[inline]
    #[must_use]
    pub fn target(self, target: impl Into<String>) -> Self {
        self.attr("target", target)
    }

    /// Marks the element as not rendered.
    #[inline]
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Sets the click behavior.
    #[inline]
    #[must_use]
    pub fn on_click(mut self, behavior: ClickBehavior) -> Self {
        self.on_click = behavior;
        self
    }

    /// Element is absent for the first `lookups` lookups in each document.
    #[inline]
    #[must_use]
    pub fn appears_after(mut self, lookups: u32) -> Self {
        self.appears_after = lookups;
        self
    }

    /// The page re-renders the element under the first `checks` visibility
    /// checks in each document, so those checks see a stale handle.
    #[inline]
    #[must_use]
    pub fn rerenders(mut self, checks: u32) -> Self {
        self.stale_checks = checks;
        self
    }
}

// ============================================================================
// MemoryPage
// ============================================================================

/// Page definition served by a [`MemoryContext`].
#[derive(Debug, Clone)]
pub struct MemoryPage {
    url: String,
    status: u16,
    text: String,
    elements: Vec<MemoryElement>,
    errors: Vec<String>,
}

impl MemoryPage {
    /// Creates an empty page answering `200` at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            text: String::new(),
            elements: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Sets the HTTP status of the main document.
    #[inline]
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the rendered text.
    #[inline]
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Adds an element.
    #[inline]
    #[must_use]
    pub fn element(mut self, element: MemoryElement) -> Self {
        self.elements.push(element);
        self
    }

    /// The page throws an uncaught error while loading.
    #[inline]
    #[must_use]
    pub fn throws_on_load(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }
}

// ============================================================================
// MemoryHandle
// ============================================================================

/// Element handle issued by a [`MemoryContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryHandle {
    document: u64,
    index: usize,
}

impl MemoryHandle {
    /// Element ID used in stale-element errors.
    #[must_use]
    pub fn element_id(&self) -> ElementId {
        ElementId::new(format!("memory-{}-{}", self.document, self.index))
    }
}

// ============================================================================
// Document
// ============================================================================

/// The live document of the context.
#[derive(Debug)]
struct Document {
    id: u64,
    url: String,
    text: String,
    elements: Vec<MemoryElement>,
    lookups: FxHashMap<usize, u32>,
    stubs: FxHashMap<String, InterceptId>,
    calls: FxHashMap<InterceptId, Vec<Vec<Value>>>,
}

impl Document {
    fn new(id: u64, url: String, page: Option<&MemoryPage>) -> Self {
        Self {
            id,
            url,
            text: page.map(|p| p.text.clone()).unwrap_or_default(),
            elements: page.map(|p| p.elements.clone()).unwrap_or_default(),
            lookups: FxHashMap::default(),
            stubs: FxHashMap::default(),
            calls: FxHashMap::default(),
        }
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug)]
struct State {
    pages: FxHashMap<String, MemoryPage>,
    unreachable: FxHashSet<String>,
    document: Document,
    next_document: u64,
    options: TestOptions,
    errors: Vec<String>,
    history: Vec<String>,
    opened: Vec<String>,
    removed: Vec<(By, String)>,
}

impl State {
    /// Replaces the document and returns the main-document status.
    fn open_document(&mut self, url: Url) -> u16 {
        self.next_document += 1;

        let key = page_key(&url);
        let page = self.pages.get(&key);
        let status = page.map_or(MISSING_PAGE_STATUS, |p| p.status);
        let load_errors = page.map(|p| p.errors.clone()).unwrap_or_default();

        self.document = Document::new(self.next_document, url.to_string(), page);
        self.history.push(url.to_string());
        for message in load_errors {
            self.record_error(message);
        }

        debug!(url = %url, status, document = self.next_document, "Document loaded");
        status
    }

    /// Resolves `url` against the current document.
    fn join(&self, url: &str) -> Result<Url> {
        Ok(Url::parse(&self.document.url)?.join(url)?)
    }

    fn record_error(&mut self, message: String) {
        if !self.options.ignore_uncaught_exceptions {
            self.errors.push(message);
        }
    }

    fn element(&self, handle: &MemoryHandle) -> Result<&MemoryElement> {
        if handle.document != self.document.id {
            return Err(Error::stale_element(handle.element_id()));
        }
        self.document
            .elements
            .get(handle.index)
            .ok_or_else(|| Error::stale_element(handle.element_id()))
    }

    fn element_mut(&mut self, handle: &MemoryHandle) -> Result<&mut MemoryElement> {
        if handle.document != self.document.id {
            return Err(Error::stale_element(handle.element_id()));
        }
        self.document
            .elements
            .get_mut(handle.index)
            .ok_or_else(|| Error::stale_element(handle.element_id()))
    }

    /// Page script calls `window.open(args...)`.
    fn window_open(&mut self, args: Vec<Value>) {
        let stub = self.document.stubs.get("window.open").cloned();
        match stub {
            Some(id) => {
                trace!(?args, "window.open intercepted");
                self.document.calls.entry(id).or_default().push(args);
            }
            None => {
                let url = args
                    .first()
                    .and_then(Value::as_str)
                    .unwrap_or(BLANK_URL)
                    .to_string();
                debug!(%url, "window.open escaped to a new window");
                self.opened.push(url);
            }
        }
    }
}

fn page_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

// ============================================================================
// MemoryContext
// ============================================================================

/// Single-context page model implementing [`AutomationContext`].
#[derive(Debug)]
pub struct MemoryContext {
    state: Mutex<State>,
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContext {
    /// Creates a context showing `about:blank` with no pages registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                pages: FxHashMap::default(),
                unreachable: FxHashSet::default(),
                document: Document::new(0, BLANK_URL.to_string(), None),
                next_document: 0,
                options: TestOptions::default(),
                errors: Vec::new(),
                history: Vec::new(),
                opened: Vec::new(),
                removed: Vec::new(),
            }),
        }
    }

    /// Registers a page. Unparsable page URLs are kept verbatim.
    #[must_use]
    pub fn with_page(self, page: MemoryPage) -> Self {
        self.add_page(page);
        self
    }

    /// Makes loads of `url` fail at the network level.
    #[must_use]
    pub fn with_unreachable(self, url: &str) -> Self {
        let key = Url::parse(url).map_or_else(|_| url.to_string(), |u| page_key(&u));
        self.state.lock().unreachable.insert(key);
        self
    }

    /// Registers or replaces a page.
    pub fn add_page(&self, page: MemoryPage) {
        let key = Url::parse(&page.url).map_or_else(|_| page.url.clone(), |u| page_key(&u));
        self.state.lock().pages.insert(key, page);
    }

    /// URLs of every document loaded, oldest first.
    #[must_use]
    pub fn load_history(&self) -> Vec<String> {
        self.state.lock().history.clone()
    }

    /// URLs that escaped into new windows.
    #[must_use]
    pub fn opened_windows(&self) -> Vec<String> {
        self.state.lock().opened.clone()
    }

    /// Attributes removed through [`AutomationContext::remove_attribute`].
    #[must_use]
    pub fn removed_attributes(&self) -> Vec<(By, String)> {
        self.state.lock().removed.clone()
    }
}

// ============================================================================
// AutomationContext
// ============================================================================

#[async_trait]
impl AutomationContext for MemoryContext {
    type Element = MemoryHandle;

    async fn setup(&self, options: &TestOptions) -> Result<()> {
        let mut state = self.state.lock();
        state.options = options.clone();
        state.errors.clear();
        Ok(())
    }

    async fn find_element(&self, by: &By) -> Result<Option<MemoryHandle>> {
        let mut state = self.state.lock();
        let document = &mut state.document;

        let Some(index) = document.elements.iter().position(|e| &e.by == by) else {
            return Ok(None);
        };

        let appears_after = document.elements[index].appears_after;
        let lookups = document.lookups.entry(index).or_insert(0);
        *lookups += 1;
        if *lookups <= appears_after {
            return Ok(None);
        }

        Ok(Some(MemoryHandle {
            document: document.id,
            index,
        }))
    }

    async fn is_visible(&self, element: &MemoryHandle) -> Result<bool> {
        let mut state = self.state.lock();
        let definition = state.element_mut(element)?;
        if definition.stale_checks > 0 {
            definition.stale_checks -= 1;
            return Err(Error::stale_element(element.element_id()));
        }
        Ok(definition.visible)
    }

    async fn attribute(&self, element: &MemoryHandle, name: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .lock()
            .element(element)?
            .attributes
            .get(name)
            .cloned())
    }

    async fn remove_attribute(&self, element: &MemoryHandle, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let el = state.element_mut(element)?;
        if el.attributes.remove(name).is_some() {
            let by = el.by.clone();
            state.removed.push((by, name.to_string()));
        }
        Ok(())
    }

    async fn click(&self, element: &MemoryHandle) -> Result<()> {
        let mut state = self.state.lock();
        let el = state.element(element)?.clone();
        debug!(by = %el.by, behavior = ?el.on_click, "Click");

        match el.on_click {
            ClickBehavior::ScriptedOpen(url) => {
                state.window_open(vec![json!(url), json!("_blank")]);
                return Ok(());
            }
            ClickBehavior::Navigate(url) => {
                let destination = state.join(&url)?;
                state.open_document(destination);
                return Ok(());
            }
            ClickBehavior::PushState(url) => {
                let destination = state.join(&url)?;
                state.document.url = destination.to_string();
                return Ok(());
            }
            ClickBehavior::Throw(message) => state.record_error(message),
            ClickBehavior::Default => {}
        }

        let Some(href) = el.attributes.get("href").filter(|h| !h.trim().is_empty()) else {
            return Ok(());
        };
        let destination = state.join(href)?;

        match el.attributes.get("target").map(String::as_str) {
            None | Some("_self") => {
                state.open_document(destination);
            }
            Some(_) => {
                debug!(url = %destination, "Anchor opened a new window");
                state.opened.push(destination.to_string());
            }
        }

        Ok(())
    }

    async fn intercept_call(&self, object_path: &str, method: &str) -> Result<Interception> {
        let mut state = self.state.lock();
        let interception = Interception::new(InterceptId::generate(), object_path, method);

        state
            .document
            .stubs
            .insert(interception.to_string(), interception.id().clone());
        state
            .document
            .calls
            .insert(interception.id().clone(), Vec::new());

        Ok(interception)
    }

    async fn call_record(&self, interception: &Interception) -> Result<CallRecord> {
        let state = self.state.lock();
        let calls = state
            .document
            .calls
            .get(interception.id())
            .cloned()
            .unwrap_or_default();
        Ok(CallRecord::new(calls))
    }

    async fn load_url(&self, url: &str, options: &LoadOptions) -> Result<()> {
        let mut state = self.state.lock();
        let destination = state.join(url)?;

        if state.unreachable.contains(&page_key(&destination)) {
            return Err(Error::load_failure(
                destination.as_str(),
                "network error: host unreachable",
            ));
        }

        let status = state.open_document(destination.clone());
        if options.rejects(status) {
            return Err(Error::load_status(destination.as_str(), status));
        }

        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().document.url.clone())
    }

    async fn page_text(&self) -> Result<String> {
        Ok(self.state.lock().document.text.clone())
    }

    async fn uncaught_errors(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().errors.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = "https://www.naukri.com/";

    fn tolerant() -> LoadOptions {
        LoadOptions::tolerant(std::time::Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_starts_blank() {
        let ctx = MemoryContext::new();
        assert_eq!(ctx.current_url().await.expect("url"), "about:blank");
        assert!(ctx.load_history().is_empty());
    }

    #[tokio::test]
    async fn test_load_unknown_page_is_404() {
        let ctx = MemoryContext::new();

        ctx.load_url("https://example.com/missing", &tolerant())
            .await
            .expect("tolerant load");

        let err = ctx
            .load_url("https://example.com/missing", &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LoadFailure { status: Some(404), .. }));
    }

    #[tokio::test]
    async fn test_unreachable_is_network_failure() {
        let ctx = MemoryContext::new().with_unreachable("https://down.example/");
        let err = ctx
            .load_url("https://down.example/", &tolerant())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LoadFailure { status: None, .. }));
    }

    #[tokio::test]
    async fn test_relative_load_joins_current_url() {
        let ctx = MemoryContext::new().with_page(MemoryPage::new(HOME));
        ctx.load_url(HOME, &tolerant()).await.expect("load");
        ctx.load_url("/jobs", &tolerant()).await.expect("load");
        assert_eq!(
            ctx.current_url().await.expect("url"),
            "https://www.naukri.com/jobs"
        );
    }

    #[tokio::test]
    async fn test_anchor_with_target_opens_new_window() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new(HOME).element(
                MemoryElement::new(By::id("register_Layer"))
                    .href("/registration/createAccount")
                    .target("_blank"),
            ),
        );
        ctx.load_url(HOME, &tolerant()).await.expect("load");

        let el = ctx
            .find_element(&By::id("register_Layer"))
            .await
            .expect("find")
            .expect("present");
        ctx.click(&el).await.expect("click");

        assert_eq!(ctx.current_url().await.expect("url"), HOME);
        assert_eq!(
            ctx.opened_windows(),
            vec!["https://www.naukri.com/registration/createAccount"]
        );
    }

    #[tokio::test]
    async fn test_anchor_without_target_navigates_and_stales_handles() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new(HOME)
                .element(MemoryElement::new(By::id("register_Layer")).target("_blank").href("/r")),
        );
        ctx.load_url(HOME, &tolerant()).await.expect("load");

        let el = ctx
            .find_element(&By::id("register_Layer"))
            .await
            .expect("find")
            .expect("present");
        ctx.remove_attribute(&el, "target").await.expect("remove");
        assert_eq!(ctx.attribute(&el, "target").await.expect("attr"), None);
        ctx.click(&el).await.expect("click");

        assert_eq!(
            ctx.current_url().await.expect("url"),
            "https://www.naukri.com/r"
        );
        assert!(matches!(
            ctx.attribute(&el, "href").await,
            Err(Error::StaleElement { .. })
        ));
        assert_eq!(
            ctx.removed_attributes(),
            vec![(By::id("register_Layer"), "target".to_string())]
        );
    }

    #[tokio::test]
    async fn test_stub_records_window_open() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new(HOME).element(
                MemoryElement::new(By::css(".cta"))
                    .on_click(ClickBehavior::ScriptedOpen("/companies".into())),
            ),
        );
        ctx.load_url(HOME, &tolerant()).await.expect("load");

        let stub = ctx.intercept_call("window", "open").await.expect("stub");
        let el = ctx
            .find_element(&By::css(".cta"))
            .await
            .expect("find")
            .expect("present");
        ctx.click(&el).await.expect("click");

        let record = ctx.call_record(&stub).await.expect("record");
        assert_eq!(record.call_count(), 1);
        assert_eq!(record.first_arg_str(), Some("/companies"));
        assert!(ctx.opened_windows().is_empty());
    }

    #[tokio::test]
    async fn test_unstubbed_window_open_escapes() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new(HOME).element(
                MemoryElement::new(By::css(".cta"))
                    .on_click(ClickBehavior::ScriptedOpen("https://x.example/".into())),
            ),
        );
        ctx.load_url(HOME, &tolerant()).await.expect("load");
        let el = ctx
            .find_element(&By::css(".cta"))
            .await
            .expect("find")
            .expect("present");
        ctx.click(&el).await.expect("click");

        assert_eq!(ctx.opened_windows(), vec!["https://x.example/"]);
    }

    #[tokio::test]
    async fn test_stub_dies_with_document() {
        let ctx = MemoryContext::new().with_page(MemoryPage::new(HOME));
        ctx.load_url(HOME, &tolerant()).await.expect("load");
        let stub = ctx.intercept_call("window", "open").await.expect("stub");

        ctx.load_url(HOME, &tolerant()).await.expect("reload");

        let record = ctx.call_record(&stub).await.expect("record");
        assert!(!record.was_called());
    }

    #[tokio::test]
    async fn test_push_state_keeps_document() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new(HOME).element(
                MemoryElement::new(By::text("Jobs"))
                    .on_click(ClickBehavior::PushState("/jobs".into())),
            ),
        );
        ctx.load_url(HOME, &tolerant()).await.expect("load");
        let el = ctx
            .find_element(&By::text("Jobs"))
            .await
            .expect("find")
            .expect("present");
        ctx.click(&el).await.expect("click");

        assert_eq!(
            ctx.current_url().await.expect("url"),
            "https://www.naukri.com/jobs"
        );
        assert!(ctx.is_visible(&el).await.expect("still attached"));
        assert_eq!(ctx.load_history().len(), 1);
    }

    #[tokio::test]
    async fn test_appears_after_lookups() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new(HOME).element(MemoryElement::new(By::id("late")).appears_after(2)),
        );
        ctx.load_url(HOME, &tolerant()).await.expect("load");

        let by = By::id("late");
        assert!(ctx.find_element(&by).await.expect("find").is_none());
        assert!(ctx.find_element(&by).await.expect("find").is_none());
        assert!(ctx.find_element(&by).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn test_rerendered_element_is_stale_once() {
        let ctx = MemoryContext::new().with_page(
            MemoryPage::new(HOME).element(MemoryElement::new(By::id("menu")).rerenders(1)),
        );
        ctx.load_url(HOME, &tolerant()).await.expect("load");

        let el = ctx.find_element(&By::id("menu")).await.expect("find").expect("present");
        assert!(matches!(ctx.is_visible(&el).await, Err(Error::StaleElement { .. })));
        assert!(ctx.is_visible(&el).await.expect("visible"));
    }

    #[tokio::test]
    async fn test_uncaught_errors_respect_options() {
        let page = MemoryPage::new(HOME).throws_on_load("TypeError: x is undefined");

        let ctx = MemoryContext::new().with_page(page.clone());
        ctx.setup(&TestOptions::default()).await.expect("setup");
        ctx.load_url(HOME, &tolerant()).await.expect("load");
        assert_eq!(
            ctx.uncaught_errors().await.expect("errors"),
            vec!["TypeError: x is undefined"]
        );

        let ctx = MemoryContext::new().with_page(page);
        ctx.setup(&TestOptions::ignoring_page_errors())
            .await
            .expect("setup");
        ctx.load_url(HOME, &tolerant()).await.expect("load");
        assert!(ctx.uncaught_errors().await.expect("errors").is_empty());
    }
}
