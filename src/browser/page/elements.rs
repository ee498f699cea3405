//! Element search methods.

use serde_json::Value;
use tracing::debug;

use crate::browser::Element;
use crate::browser::selector::By;
use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::protocol::{Command, ElementCommand};
use crate::wait::{Polled, Probe, Wait, poll};

use super::Page;

// ============================================================================
// Constants
// ============================================================================

/// Error code the content script uses when no element matches.
const NO_SUCH_ELEMENT_CODE: &str = "no such element";

// ============================================================================
// Page - Element Search
// ============================================================================

impl Page {
    /// Finds the first element matching `by`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let link = page.find_element(By::id("register_Layer")).await?;
    /// let menu = page.find_element(By::css(".nI-gNb-menus .companies")).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::ElementNotFound`] if nothing matches right now.
    pub async fn find_element(&self, by: By) -> Result<Element> {
        self.query_element(&by)
            .await?
            .ok_or_else(|| Error::element_not_found(by.to_string(), 0))
    }

    /// Finds the first element matching `by`, or `None` if absent.
    pub async fn query_element(&self, by: &By) -> Result<Option<Element>> {
        let command = Command::Element(ElementCommand::Find {
            strategy: by.strategy().to_string(),
            value: by.value().to_string(),
            parent_id: None,
        });

        let response = self
            .send_raw(command, self.inner.window.command_timeout())
            .await?;
        if response.error.as_deref() == Some(NO_SUCH_ELEMENT_CODE) {
            return Ok(None);
        }

        let element = response
            .into_result()?
            .get("elementId")
            .and_then(Value::as_str)
            .map(|id| {
                Element::new(
                    ElementId::new(id),
                    self.inner.frame_id,
                    self.inner.window.clone(),
                )
            });

        debug!(%by, found = element.is_some(), "Queried element");
        Ok(element)
    }

    /// Finds all elements matching `by`.
    pub async fn find_elements(&self, by: &By) -> Result<Vec<Element>> {
        let command = Command::Element(ElementCommand::FindAll {
            strategy: by.strategy().to_string(),
            value: by.value().to_string(),
            parent_id: None,
        });

        let result = self.send_command(command).await?;

        let elements = result
            .get("elementIds")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(|id| {
                        Element::new(
                            ElementId::new(id),
                            self.inner.frame_id,
                            self.inner.window.clone(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(elements)
    }

    /// Waits until an element matching `by` exists.
    ///
    /// # Errors
    ///
    /// [`Error::ElementNotFound`] carrying the wait budget if it expires.
    pub async fn wait_for_element(&self, by: By, wait: Wait) -> Result<Element> {
        let by_ref = &by;
        let polled = poll(wait, || async move {
            Ok(match self.query_element(by_ref).await? {
                Some(element) => Probe::Ready(element),
                None => Probe::Pending(None),
            })
        })
        .await?;

        match polled {
            Polled::Ready(element) => Ok(element),
            Polled::Expired { .. } => Err(Error::element_not_found(
                by.to_string(),
                wait.timeout_ms(),
            )),
        }
    }
}
