//! Builder pattern for driver configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use nav_resolver::Driver;
//!
//! # fn example() -> nav_resolver::Result<()> {
//! let driver = Driver::builder()
//!     .binary("/usr/bin/firefox")
//!     .extension("./extension")
//!     .command_timeout(Duration::from_secs(60))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{DEFAULT_ACCEPT_TIMEOUT, DEFAULT_COMMAND_TIMEOUT};

use super::ExtensionSource;
use super::core::Driver;

// ============================================================================
// DriverBuilder
// ============================================================================

/// Builder for configuring a [`Driver`] instance.
///
/// Use [`Driver::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct DriverBuilder {
    binary: Option<PathBuf>,
    extension: Option<ExtensionSource>,
    command_timeout: Duration,
    accept_timeout: Duration,
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self {
            binary: None,
            extension: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
        }
    }
}

impl DriverBuilder {
    /// Creates a builder with default timeouts and no binary or extension.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the path to the Firefox binary.
    #[inline]
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Sets the bridge extension from a directory or `.xpi` path.
    #[inline]
    #[must_use]
    pub fn extension(mut self, path: impl Into<PathBuf>) -> Self {
        self.extension = Some(ExtensionSource::from(path.into()));
        self
    }

    /// Sets the bridge extension from base64-encoded `.xpi` content.
    #[inline]
    #[must_use]
    pub fn extension_base64(mut self, data: impl Into<String>) -> Self {
        self.extension = Some(ExtensionSource::base64(data));
        self
    }

    /// Sets the per-command response timeout.
    ///
    /// This bounds single bridge round-trips; page loads use their own
    /// timeout on top of it.
    #[inline]
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets how long a spawned window may take to connect back.
    #[inline]
    #[must_use]
    pub fn accept_timeout(mut self, timeout: Duration) -> Self {
        self.accept_timeout = timeout;
        self
    }

    /// Builds the driver with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if binary or extension is not set, or a timeout is zero
    /// - [`Error::BrowserNotFound`] if the binary path doesn't exist
    /// - [`Error::Config`] if the extension path doesn't exist
    pub fn build(self) -> Result<Driver> {
        let binary = self.binary.ok_or_else(|| {
            Error::config(
                "Firefox binary path is required. Use .binary() to set it.\n\
                 Example: Driver::builder().binary(\"/usr/bin/firefox\")",
            )
        })?;
        if !binary.exists() {
            return Err(Error::browser_not_found(binary));
        }

        let extension = self.extension.ok_or_else(|| {
            Error::config(
                "Extension is required. Use .extension() or .extension_base64() to set it.",
            )
        })?;
        if let Some(path) = extension.path()
            && !path.exists()
        {
            return Err(Error::config(format!(
                "Extension not found at: {}",
                path.display()
            )));
        }

        if self.command_timeout.is_zero() || self.accept_timeout.is_zero() {
            return Err(Error::config("driver timeouts must be greater than zero"));
        }

        Ok(Driver::new(
            binary,
            extension,
            self.command_timeout,
            self.accept_timeout,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let builder = DriverBuilder::new();
        assert!(builder.binary.is_none());
        assert!(builder.extension.is_none());
        assert_eq!(builder.command_timeout, DEFAULT_COMMAND_TIMEOUT);
        assert_eq!(builder.accept_timeout, DEFAULT_ACCEPT_TIMEOUT);
    }

    #[test]
    fn test_build_fails_without_binary() {
        let err = DriverBuilder::new()
            .extension_base64("UEsDBBQ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("binary"));
    }

    #[test]
    fn test_build_fails_without_extension() {
        let err = DriverBuilder::new().binary("/bin/sh").build().unwrap_err();
        assert!(err.to_string().contains("Extension"));
    }

    #[test]
    fn test_build_fails_with_nonexistent_binary() {
        let err = DriverBuilder::new()
            .binary("/nonexistent/firefox")
            .extension_base64("UEsDBBQ")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BrowserNotFound { .. }));
    }

    #[test]
    fn test_build_fails_with_missing_extension_path() {
        let err = DriverBuilder::new()
            .binary("/bin/sh")
            .extension("/nonexistent/bridge.xpi")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_rejects_zero_timeout() {
        let err = DriverBuilder::new()
            .binary("/bin/sh")
            .extension_base64("UEsDBBQ")
            .accept_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_succeeds() {
        let driver = DriverBuilder::new()
            .binary("/bin/sh")
            .extension_base64("UEsDBBQ")
            .command_timeout(Duration::from_secs(5))
            .build()
            .expect("build");
        assert_eq!(driver.command_timeout(), Duration::from_secs(5));
    }
}
