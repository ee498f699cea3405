//! Core Page struct and accessors.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::context::TestOptions;
use crate::error::Result;
use crate::identifiers::{FrameId, SessionId, TabId};
use crate::protocol::{Command, Response};

use crate::browser::Window;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a page.
pub(crate) struct PageInner {
    /// Frame commands are sent to.
    pub frame_id: FrameId,
    /// Owning window.
    pub window: Window,
    /// Options of the current test.
    pub options: Mutex<TestOptions>,
    /// ID of the installed error-collector preload script.
    pub collector_id: Mutex<Option<String>>,
    /// Errors harvested from documents that have since been replaced.
    pub harvested_errors: Mutex<Vec<String>>,
}

// ============================================================================
// Page
// ============================================================================

/// A handle to the controlled page.
///
/// Cloning is cheap; clones share test options and collected errors.
#[derive(Clone)]
pub struct Page {
    pub(crate) inner: Arc<PageInner>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("tab_id", &self.tab_id())
            .field("frame_id", &self.inner.frame_id)
            .field("session_id", &self.session_id())
            .finish_non_exhaustive()
    }
}

impl Page {
    pub(crate) fn new(window: Window, frame_id: FrameId) -> Self {
        Self {
            inner: Arc::new(PageInner {
                frame_id,
                window,
                options: Mutex::new(TestOptions::default()),
                collector_id: Mutex::new(None),
                harvested_errors: Mutex::new(Vec::new()),
            }),
        }
    }
}

// ============================================================================
// Page - Accessors
// ============================================================================

impl Page {
    /// Returns the tab ID.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.inner.window.tab_id()
    }

    /// Returns the frame ID.
    #[inline]
    #[must_use]
    pub fn frame_id(&self) -> FrameId {
        self.inner.frame_id
    }

    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.window.session_id()
    }

    /// Returns the owning window.
    #[inline]
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.inner.window
    }

    /// Returns the options of the current test.
    #[must_use]
    pub fn test_options(&self) -> TestOptions {
        self.inner.options.lock().clone()
    }
}

// ============================================================================
// Page - Internal
// ============================================================================

impl Page {
    /// Sends a command with the window's command timeout.
    pub(crate) async fn send_command(&self, command: Command) -> Result<Value> {
        self.send_raw(command, self.inner.window.command_timeout())
            .await?
            .into_result()
    }

    /// Sends a command and returns the response without error mapping.
    pub(crate) async fn send_raw(
        &self,
        command: Command,
        timeout: std::time::Duration,
    ) -> Result<Response> {
        self.inner
            .window
            .send(self.inner.frame_id, command, timeout)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Page;

    #[test]
    fn test_page_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync + std::fmt::Debug>() {}
        assert_traits::<Page>();
    }
}
