//! DOM element handles.
//!
//! Elements are identified by UUID and stored in the content script's
//! internal `Map<UUID, Element>`. Every operation is a generic dynamic
//! property access or method call (`element[name]`, `element[name](...)`).
//!
//! # Example
//!
//! ```ignore
//! let link = page.find_element(By::id("register_Layer")).await?;
//!
//! let href = link.get_attribute("href").await?;
//! link.remove_attribute("target").await?;
//! link.click().await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, FrameId};
use crate::protocol::{Command, ElementCommand};

use super::Window;

// ============================================================================
// Constants
// ============================================================================

/// Error code the content script uses once an element left the document.
const STALE_ELEMENT_CODE: &str = "stale element reference";

// ============================================================================
// Types
// ============================================================================

pub(crate) struct ElementInner {
    /// This element's unique ID.
    pub id: ElementId,
    /// Frame the element lives in.
    pub frame_id: FrameId,
    /// Owning window.
    pub window: Window,
}

// ============================================================================
// Element
// ============================================================================

/// A handle to a DOM element in the controlled page.
///
/// Handles go stale when the page navigates; operations on a stale handle
/// fail with [`Error::StaleElement`].
#[derive(Clone)]
pub struct Element {
    pub(crate) inner: Arc<ElementInner>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.inner.id)
            .field("frame_id", &self.inner.frame_id)
            .finish_non_exhaustive()
    }
}

impl Element {
    pub(crate) fn new(id: ElementId, frame_id: FrameId, window: Window) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                id,
                frame_id,
                window,
            }),
        }
    }

    /// Returns this element's ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.inner.id
    }
}

// ============================================================================
// Element - Actions
// ============================================================================

impl Element {
    /// Clicks the element via `element.click()`.
    ///
    /// Handlers run synchronously inside the call, so a `window.open` made
    /// by the handler is recorded by the time this returns.
    pub async fn click(&self) -> Result<()> {
        debug!(element_id = %self.inner.id, "Clicking element");
        self.call_method("click", vec![]).await?;
        Ok(())
    }

    /// Removes an attribute. Removing a missing attribute is a no-op.
    pub async fn remove_attribute(&self, name: &str) -> Result<()> {
        debug!(element_id = %self.inner.id, attribute = name, "Removing attribute");
        self.call_method("removeAttribute", vec![Value::String(name.to_string())])
            .await?;
        Ok(())
    }
}

// ============================================================================
// Element - Properties
// ============================================================================

impl Element {
    /// Gets an attribute value, or `None` if the attribute is absent.
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let result = self
            .call_method("getAttribute", vec![Value::String(name.to_string())])
            .await?;
        Ok(result.as_str().map(str::to_string))
    }

    /// Gets the element's text content.
    pub async fn get_text(&self) -> Result<String> {
        let value = self.get_property("textContent").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Checks if the element is rendered.
    ///
    /// Returns `false` if `offsetParent` is null.
    pub async fn is_displayed(&self) -> Result<bool> {
        let offset_parent = self.get_property("offsetParent").await?;
        Ok(!offset_parent.is_null())
    }

    /// Gets `element[name]`.
    pub async fn get_property(&self, name: &str) -> Result<Value> {
        let command = Command::Element(ElementCommand::GetProperty {
            element_id: self.inner.id.clone(),
            name: name.to_string(),
        });
        let result = self.send_command(command).await?;
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Calls `element[name](...args)` and returns its result.
    pub async fn call_method(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let command = Command::Element(ElementCommand::CallMethod {
            element_id: self.inner.id.clone(),
            name: name.to_string(),
            args,
        });
        let result = self.send_command(command).await?;
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }
}

// ============================================================================
// Element - Internal
// ============================================================================

impl Element {
    async fn send_command(&self, command: Command) -> Result<Value> {
        let window = &self.inner.window;
        let response = window
            .send(self.inner.frame_id, command, window.command_timeout())
            .await?;

        if response.error.as_deref() == Some(STALE_ELEMENT_CODE) {
            return Err(Error::stale_element(self.inner.id.clone()));
        }
        response.into_result()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Element;

    #[test]
    fn test_element_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync + std::fmt::Debug>() {}
        assert_traits::<Element>();
    }
}
