//! Firefox driver: launches windows wired to the bridge extension.
//!
//! Each window gets its own WebSocket server, profile and process, so
//! windows never share a connection.
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
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::browser::{Window, WindowBuilder};
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::transport::PendingServer;

use super::assets;
use super::builder::DriverBuilder;
use super::options::BrowserOptions;
use super::{ExtensionSource, Profile};

// ============================================================================
// Driver
// ============================================================================

pub(crate) struct DriverInner {
    pub binary: PathBuf,
    pub extension: ExtensionSource,
    pub command_timeout: Duration,
    pub accept_timeout: Duration,
}

/// Firefox launcher.
///
/// Cloning is cheap. The driver holds no windows; each [`Window`] owns its
/// process and is closed independently.
#[derive(Clone)]
pub struct Driver {
    pub(crate) inner: Arc<DriverInner>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("binary", &self.inner.binary)
            .field("command_timeout", &self.inner.command_timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Driver - Public API
// ============================================================================

impl Driver {
    /// Creates a configuration builder for the driver.
    #[inline]
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// Creates a window builder.
    #[inline]
    #[must_use]
    pub fn window(&self) -> WindowBuilder<'_> {
        WindowBuilder::new(self)
    }

    /// Per-command response timeout for spawned windows.
    #[inline]
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        self.inner.command_timeout
    }
}

// ============================================================================
// Driver - Internal API
// ============================================================================

impl Driver {
    pub(crate) fn new(
        binary: PathBuf,
        extension: ExtensionSource,
        command_timeout: Duration,
        accept_timeout: Duration,
    ) -> Self {
        debug!(binary = %binary.display(), "Driver configured");
        Self {
            inner: Arc::new(DriverInner {
                binary,
                extension,
                command_timeout,
                accept_timeout,
            }),
        }
    }

    /// Prepares a profile, launches Firefox and waits for the bridge.
    pub(crate) async fn spawn_window(
        &self,
        options: BrowserOptions,
        custom_profile: Option<PathBuf>,
    ) -> Result<Window> {
        options.validate()?;

        let profile = match custom_profile {
            Some(path) => Profile::from_path(path)?,
            None => Profile::new_temp()?,
        };
        profile.install_extension(&self.inner.extension)?;
        profile.write_prefs(&Profile::automation_prefs())?;

        let server = PendingServer::bind_localhost().await?;
        let session_id = SessionId::next();
        let ws_url = server.ws_url();
        let data_uri = assets::build_init_data_uri(&ws_url, session_id);
        debug!(%session_id, url = %ws_url, "Bound bridge server");

        let child = self.spawn_process(&profile, &options, &data_uri)?;
        info!(pid = child.id(), %session_id, "Firefox process spawned");

        let (connection, ready) = match server.accept(self.inner.accept_timeout).await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(%session_id, error = %e, "Bridge did not connect");
                return Err(e);
            }
        };

        if ready.session_id != session_id {
            warn!(
                expected = %session_id,
                actual = %ready.session_id,
                "READY carried an unexpected session ID"
            );
        }

        let window = Window::new(
            connection,
            ready,
            Some(child),
            Some(profile),
            self.inner.command_timeout,
        );
        info!(%session_id, tab_id = %window.tab_id(), "Window spawned");
        Ok(window)
    }

    fn spawn_process(
        &self,
        profile: &Profile,
        options: &BrowserOptions,
        data_uri: &str,
    ) -> Result<Child> {
        let mut cmd = Command::new(&self.inner.binary);

        cmd.arg("--profile")
            .arg(profile.path())
            .arg("--no-remote")
            .arg("--new-instance")
            .args(options.to_args())
            .arg(data_uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        cmd.spawn().map_err(Error::process_launch_failed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_is_clone_debug() {
        fn assert_traits<T: Clone + fmt::Debug + Send + Sync>() {}
        assert_traits::<Driver>();
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_options() {
        let driver = Driver::new(
            PathBuf::from("/bin/sh"),
            ExtensionSource::base64("UEsDBBQ"),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        let err = driver
            .window()
            .window_size(0, 0)
            .spawn()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }
}
