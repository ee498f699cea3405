//! [`AutomationContext`] for a live Firefox page.

use async_trait::async_trait;
use tracing::debug;

use crate::browser::{By, Element};
use crate::context::{AutomationContext, CallRecord, Interception, LoadOptions, TestOptions};
use crate::error::Result;

use super::Page;

#[async_trait]
impl AutomationContext for Page {
    type Element = Element;

    async fn setup(&self, options: &TestOptions) -> Result<()> {
        *self.inner.options.lock() = options.clone();
        self.inner.harvested_errors.lock().clear();

        if options.ignore_uncaught_exceptions {
            self.remove_error_collector().await?;
        } else {
            self.install_error_collector().await?;
        }

        debug!(
            ignore_uncaught_exceptions = options.ignore_uncaught_exceptions,
            "Page prepared for test"
        );
        Ok(())
    }

    async fn find_element(&self, by: &By) -> Result<Option<Element>> {
        self.query_element(by).await
    }

    async fn is_visible(&self, element: &Element) -> Result<bool> {
        element.is_displayed().await
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        element.get_attribute(name).await
    }

    async fn remove_attribute(&self, element: &Element, name: &str) -> Result<()> {
        element.remove_attribute(name).await
    }

    async fn click(&self, element: &Element) -> Result<()> {
        element.click().await
    }

    async fn intercept_call(&self, object_path: &str, method: &str) -> Result<Interception> {
        self.install_interceptor(object_path, method).await
    }

    async fn call_record(&self, interception: &Interception) -> Result<CallRecord> {
        self.read_calls(interception).await
    }

    async fn load_url(&self, url: &str, options: &LoadOptions) -> Result<()> {
        self.load(url, options).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.get_url().await
    }

    async fn page_text(&self) -> Result<String> {
        Page::page_text(self).await
    }

    async fn uncaught_errors(&self) -> Result<Vec<String>> {
        if self.inner.options.lock().ignore_uncaught_exceptions {
            return Ok(Vec::new());
        }
        self.collected_errors().await
    }
}
