//! Page navigation methods.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::context::LoadOptions;
use crate::error::{Error, Result};
use crate::protocol::{BrowsingContextCommand, Command};

use super::Page;

// ============================================================================
// Constants
// ============================================================================

/// Slack on top of the load timeout for the bridge to report back.
const NAVIGATE_RESPONSE_SLACK: Duration = Duration::from_secs(5);

/// Reads the main document status when the bridge did not report one.
const STATUS_SCRIPT: &str = "/* nav-resolver:status */ \
    const entry = performance.getEntriesByType('navigation')[0]; \
    return entry && entry.responseStatus ? entry.responseStatus : null;";

// ============================================================================
// LoadStatus
// ============================================================================

/// Result of a completed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatus {
    /// URL after redirects.
    pub url: String,
    /// HTTP status of the main document, when the browser exposes it.
    pub status: Option<u16>,
}

impl LoadStatus {
    /// Returns `true` for a known 2xx/3xx status.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..400).contains(&s))
    }
}

// ============================================================================
// Page - Navigation
// ============================================================================

impl Page {
    /// Navigates to a URL with default (strict) load options.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn goto(&self, url: &str) -> Result<LoadStatus> {
        self.load(url, &LoadOptions::default()).await
    }

    /// Loads `url` into the page and waits for the load to finish.
    ///
    /// Relative URLs resolve against the current document. Uncaught errors of
    /// the outgoing document are harvested first so they are not lost.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if `url` cannot be resolved
    /// - [`Error::LoadFailure`] if the load fails, times out, or (when
    ///   `options.fail_on_status_code` is set) ends with a non-2xx/3xx status
    /// - Connection errors from the bridge
    pub async fn load(&self, url: &str, options: &LoadOptions) -> Result<LoadStatus> {
        let url = self.absolute_url(url).await?;
        self.harvest_errors().await?;

        debug!(
            %url,
            tab_id = %self.tab_id(),
            fail_on_status_code = options.fail_on_status_code,
            "Loading URL"
        );

        let command = Command::BrowsingContext(BrowsingContextCommand::Navigate {
            url: url.to_string(),
            timeout_ms: Some(options.timeout.as_millis() as u64),
        });

        let result = match self
            .send_raw(command, options.timeout + NAVIGATE_RESPONSE_SLACK)
            .await
            .and_then(|response| response.into_result())
        {
            Ok(result) => result,
            Err(e) if e.is_connection_error() => return Err(e),
            Err(e) => {
                warn!(%url, error = %e, "Load failed");
                return Err(Error::load_failure(url.as_str(), e.to_string()));
            }
        };

        let final_url = result
            .get("url")
            .and_then(Value::as_str)
            .map_or_else(|| url.to_string(), str::to_string);

        let status = match status_of(&result) {
            Some(status) => Some(status),
            None => self.document_status().await?,
        };

        let loaded = LoadStatus {
            url: final_url,
            status,
        };

        if let Some(status) = loaded.status
            && options.rejects(status)
        {
            warn!(url = %loaded.url, status, "Load rejected by status code");
            return Err(Error::load_status(loaded.url, status));
        }

        debug!(url = %loaded.url, status = ?loaded.status, "Load finished");
        Ok(loaded)
    }

    /// Gets the current URL.
    pub async fn get_url(&self) -> Result<String> {
        let command = Command::BrowsingContext(BrowsingContextCommand::GetUrl);
        let result = self.send_command(command).await?;

        let url = result
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        debug!(tab_id = %self.tab_id(), %url, "Got page URL");
        Ok(url)
    }

    /// Gets the current page title.
    pub async fn get_title(&self) -> Result<String> {
        let command = Command::BrowsingContext(BrowsingContextCommand::GetTitle);
        let result = self.send_command(command).await?;

        Ok(result
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Resolves `url` against the current document.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] if `url` is relative and the current document
    /// has no usable base.
    pub async fn absolute_url(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = Url::parse(&self.get_url().await?)?;
                Ok(base.join(url)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Status from the Navigation Timing entry of the current document.
    async fn document_status(&self) -> Result<Option<u16>> {
        match self.execute_script(STATUS_SCRIPT).await {
            Ok(value) => Ok(value.as_u64().and_then(|s| u16::try_from(s).ok())),
            Err(Error::ScriptError { message }) => {
                debug!(%message, "Document status unavailable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// `status` field of a navigate result.
fn status_of(result: &Value) -> Option<u16> {
    result
        .get("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .filter(|&s| s != 0)
}

// ============================================================================
// Tests
// ============================================================================
