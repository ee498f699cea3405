//! Browser window: one Firefox process, one bridge connection, one page.
//!
//! # Example
//!
//! ```no_run
//! use nav_resolver::Driver;
//!
//! # async fn example() -> nav_resolver::Result<()> {
//! let driver = Driver::builder()
//!     .binary("/usr/bin/firefox")
//!     .extension("./extension")
//!     .build()?;
//!
//! let window = driver.window().headless().spawn().await?;
//! let page = window.page();
//! page.goto("https://www.naukri.com/").await?;
//!
//! window.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::Child;
use tracing::{debug, info};

use crate::driver::{BrowserOptions, Driver, Profile};
use crate::error::Result;
use crate::identifiers::{FrameId, SessionId, TabId};
use crate::protocol::{Command, Request, Response};
use crate::transport::{Connection, DEFAULT_COMMAND_TIMEOUT, PendingServer, ReadyData};

use super::Page;

// ============================================================================
// ProcessGuard
// ============================================================================

/// Kills the child process when dropped.
struct ProcessGuard {
    child: Option<Child>,
    pid: u32,
}

impl ProcessGuard {
    fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Kills the process and waits for it to exit.
    async fn kill(mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing Firefox process");
            if let Err(e) = child.kill().await {
                debug!(pid = self.pid, error = %e, "Failed to kill process");
            }
            if let Err(e) = child.wait().await {
                debug!(pid = self.pid, error = %e, "Failed to wait for process");
            }
            info!(pid = self.pid, "Process terminated");
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Window
// ============================================================================

pub(crate) struct WindowInner {
    pub session_id: SessionId,
    pub tab_id: TabId,
    pub connection: Connection,
    pub command_timeout: Duration,
    process: Mutex<Option<ProcessGuard>>,
    /// Kept alive so a temporary profile outlives the process.
    _profile: Option<Profile>,
}

/// A handle to a Firefox window driven through the bridge extension.
///
/// Cloning is cheap. The process (if this handle launched it) is killed on
/// [`close`](Self::close) or when the last clone is dropped.
#[derive(Clone)]
pub struct Window {
    pub(crate) inner: Arc<WindowInner>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("session_id", &self.inner.session_id)
            .field("tab_id", &self.inner.tab_id)
            .field("pid", &self.pid())
            .finish_non_exhaustive()
    }
}

impl Window {
    pub(crate) fn new(
        connection: Connection,
        ready: ReadyData,
        process: Option<Child>,
        profile: Option<Profile>,
        command_timeout: Duration,
    ) -> Self {
        debug!(
            session_id = %ready.session_id,
            tab_id = %ready.tab_id,
            launched = process.is_some(),
            "Window created"
        );

        Self {
            inner: Arc::new(WindowInner {
                session_id: ready.session_id,
                tab_id: ready.tab_id,
                connection,
                command_timeout,
                process: Mutex::new(process.map(ProcessGuard::new)),
                _profile: profile,
            }),
        }
    }

    /// Waits for a bridge extension to connect to `server` and wraps the
    /// connection, without launching a browser.
    ///
    /// Commands use [`DEFAULT_COMMAND_TIMEOUT`]; see
    /// [`attach_with_timeout`](Self::attach_with_timeout).
    ///
    /// # Errors
    ///
    /// See [`PendingServer::accept`].
    pub async fn attach(server: PendingServer, accept_timeout: Duration) -> Result<Self> {
        Self::attach_with_timeout(server, accept_timeout, DEFAULT_COMMAND_TIMEOUT).await
    }

    /// Like [`attach`](Self::attach), with a custom per-command timeout.
    ///
    /// # Errors
    ///
    /// See [`PendingServer::accept`].
    pub async fn attach_with_timeout(
        server: PendingServer,
        accept_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<Self> {
        let (connection, ready) = server.accept(accept_timeout).await?;
        Ok(Self::new(connection, ready, None, None, command_timeout))
    }
}

// ============================================================================
// Window - Accessors
// ============================================================================

impl Window {
    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.inner.session_id
    }

    /// Returns the tab the bridge controls.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.inner.tab_id
    }

    /// Returns the Firefox process ID, or 0 for attached windows.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.inner
            .process
            .lock()
            .as_ref()
            .map_or(0, |guard| guard.pid)
    }

    /// Returns the per-command response timeout.
    #[inline]
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        self.inner.command_timeout
    }

    /// Returns the page (the single browsing context) of this window.
    #[must_use]
    pub fn page(&self) -> Page {
        Page::new(self.clone(), FrameId::main())
    }
}

// ============================================================================
// Window - Lifecycle
// ============================================================================

impl Window {
    /// Closes the bridge connection and kills the Firefox process.
    pub async fn close(&self) -> Result<()> {
        debug!(session_id = %self.inner.session_id, "Closing window");
        self.inner.connection.shutdown();

        let guard = self.inner.process.lock().take();
        if let Some(guard) = guard {
            guard.kill().await;
        }

        info!(session_id = %self.inner.session_id, "Window closed");
        Ok(())
    }
}

// ============================================================================
// Window - Internal
// ============================================================================

impl Window {
    /// Sends a command to `frame_id` of the controlled tab.
    pub(crate) async fn send(
        &self,
        frame_id: FrameId,
        command: Command,
        timeout: Duration,
    ) -> Result<Response> {
        let request = Request::new(self.inner.tab_id, frame_id, command);
        self.inner
            .connection
            .send_with_timeout(request, timeout)
            .await
    }
}

// ============================================================================
// WindowBuilder
// ============================================================================

/// Builder for launching a window.
pub struct WindowBuilder<'a> {
    driver: &'a Driver,
    options: BrowserOptions,
    profile: Option<PathBuf>,
}

impl<'a> WindowBuilder<'a> {
    pub(crate) fn new(driver: &'a Driver) -> Self {
        Self {
            driver,
            options: BrowserOptions::new(),
            profile: None,
        }
    }

    /// Runs Firefox without a visible window.
    #[must_use]
    pub fn headless(mut self) -> Self {
        self.options = self.options.with_headless();
        self
    }

    /// Sets the window size in pixels.
    #[must_use]
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.options = self.options.with_window_size(width, height);
        self
    }

    /// Passes an extra command-line argument to Firefox.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.options = self.options.with_arg(arg);
        self
    }

    /// Uses a persistent profile directory instead of a temporary one.
    #[must_use]
    pub fn profile(mut self, path: impl Into<PathBuf>) -> Self {
        self.profile = Some(path.into());
        self
    }

    /// Launches Firefox and waits for the bridge to connect.
    ///
    /// # Errors
    ///
    /// - [`Error::Profile`](crate::Error::Profile) if the profile cannot be prepared
    /// - [`Error::ProcessLaunchFailed`](crate::Error::ProcessLaunchFailed) if Firefox does not start
    /// - [`Error::ConnectionTimeout`](crate::Error::ConnectionTimeout) if the bridge never connects
    pub async fn spawn(self) -> Result<Window> {
        self.driver.spawn_window(self.options, self.profile).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Window;

    #[test]
    fn test_window_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync + std::fmt::Debug>() {}
        assert_traits::<Window>();
    }
}
