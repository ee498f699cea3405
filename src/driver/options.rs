//! Firefox command-line options.
//!
//! ```ignore
//! let options = BrowserOptions::new()
//!     .with_headless()
//!     .with_window_size(1366, 768);
//!
//! assert_eq!(options.to_args(), ["--headless", "--window-size", "1366,768"]);
//! ```

use crate::error::{Error, Result};

/// How a window's Firefox process is launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Window dimensions in pixels (width, height).
    pub window_size: Option<(u32, u32)>,
    /// Additional command-line arguments.
    pub extra_args: Vec<String>,
}

impl BrowserOptions {
    /// Creates default (headed) options.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headless: false,
            window_size: None,
            extra_args: Vec::new(),
        }
    }

    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets window size in pixels.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Adds a command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Converts options to Firefox command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(3 + self.extra_args.len());

        if self.headless {
            args.push("--headless".to_string());
        }

        if let Some((width, height)) = self.window_size {
            args.push("--window-size".to_string());
            args.push(format!("{width},{height}"));
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Checks the options before launch.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a zero window dimension.
    pub fn validate(&self) -> Result<()> {
        if let Some((width, height)) = self.window_size
            && (width == 0 || height == 0)
        {
            return Err(Error::invalid_argument(
                "window dimensions must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_args() {
        assert!(BrowserOptions::new().to_args().is_empty());
        assert_eq!(BrowserOptions::new(), BrowserOptions::default());
    }

    #[test]
    fn test_to_args_order() {
        let args = BrowserOptions::new()
            .with_headless()
            .with_window_size(1366, 768)
            .with_arg("--lang=en-IN")
            .to_args();
        assert_eq!(args, ["--headless", "--window-size", "1366,768", "--lang=en-IN"]);
    }

    #[test]
    fn test_validate_zero_dimension() {
        assert!(BrowserOptions::new().with_window_size(800, 600).validate().is_ok());
        assert!(matches!(
            BrowserOptions::new().with_window_size(0, 600).validate(),
            Err(Error::InvalidArgument { .. })
        ));
    }
}
